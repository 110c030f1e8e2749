pub mod ds18b20;
pub mod sampler;

pub use ds18b20::W1Bus;
pub use sampler::{SamplingTask, SnapshotReader};
