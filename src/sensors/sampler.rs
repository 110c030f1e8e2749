/// Periodic acquisition of a full temperature snapshot
use log::{debug, error, info};
use std::sync::{Arc, Mutex, MutexGuard};

use super::ds18b20::TemperatureSource;
use crate::models::TemperatureSnapshot;
use crate::tasks::{Shutdown, Signal};

fn lock(snapshot: &Mutex<TemperatureSnapshot>) -> MutexGuard<'_, TemperatureSnapshot> {
    snapshot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Read access to the latest published snapshot
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    snapshot: Arc<Mutex<TemperatureSnapshot>>,
}

impl SnapshotReader {
    /// Copy of the latest snapshot
    pub fn get(&self) -> TemperatureSnapshot {
        *lock(&self.snapshot)
    }
}

pub struct SamplingTask<S> {
    source: S,
    devices: Vec<String>,
    snapshot: Arc<Mutex<TemperatureSnapshot>>,
}

impl<S: TemperatureSource> SamplingTask<S> {
    /// `devices` must be in positional order (see `TemperatureSnapshot::from_readings`)
    pub fn new(source: S, devices: Vec<String>) -> Self {
        SamplingTask {
            source,
            devices,
            snapshot: Arc::new(Mutex::new(TemperatureSnapshot::default())),
        }
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            snapshot: Arc::clone(&self.snapshot),
        }
    }

    /// Read every channel once, in order, and publish the result
    pub async fn sample(&self) -> TemperatureSnapshot {
        let mut readings = Vec::with_capacity(self.devices.len());
        for device in &self.devices {
            readings.push(self.source.read(device).await);
        }

        match TemperatureSnapshot::from_readings(&readings) {
            Some(snapshot) => {
                debug!("Sampled {:?}", snapshot);
                *lock(&self.snapshot) = snapshot;
                snapshot
            }
            None => {
                error!(
                    "Only {} sensor channels configured, keeping previous snapshot",
                    readings.len()
                );
                *lock(&self.snapshot)
            }
        }
    }

    /// Sample on every go-sample signal and report completion on sample-ready
    pub async fn run(self, go_sample: Signal, sample_ready: Signal, shutdown: Shutdown) {
        info!("Sampling {} temperature channels", self.devices.len());
        // First reading so the data log has values before the first tick
        self.sample().await;

        while go_sample.wait_or_shutdown(&shutdown).await {
            self.sample().await;
            sample_ready.post();
        }

        info!("Sampling task stopped");
    }
}
