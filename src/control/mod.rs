pub mod control_loop;
pub mod controller;
pub mod history;
pub mod policy;
pub mod prognosis;
pub mod window;

pub use control_loop::{ControlLoop, ControlStatus};
pub use window::WindowActuator;
