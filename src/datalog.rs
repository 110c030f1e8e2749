/// Append-only, tab-separated record of readings and controller state
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::models::{ControlState, TemperatureSnapshot};
use crate::utils::now_formatted;

/// Columns written after the sensor labels
pub const CONTROL_COLUMNS: [&str; 4] = ["u", "Tref", "Sb_F", "M_F"];

pub struct DataLogger {
    path: PathBuf,
    file: File,
}

impl DataLogger {
    /// Create `<dir>/logdata<N>.txt` with the first free N and write the header
    pub async fn create(dir: &Path, sensor_labels: &[String], time_step_secs: u64) -> io::Result<Self> {
        fs::create_dir_all(dir).await?;
        let path = next_free_path(dir).await;

        let mut file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)
            .await?;

        let header = format!(
            "Test started at {}\nTime step is {}\n{}\n",
            now_formatted(),
            time_step_secs,
            header_line(sensor_labels)
        );
        file.write_all(header.as_bytes()).await?;
        file.flush().await?;

        Ok(DataLogger { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped row
    pub async fn update(&mut self, values: &[String]) -> io::Result<()> {
        let mut line = now_formatted();
        for value in values {
            line.push('\t');
            line.push_str(value);
        }
        line.push('\n');
        self.file.write_all(line.as_bytes()).await?;
        self.file.flush().await
    }
}

async fn next_free_path(dir: &Path) -> PathBuf {
    let mut counter = 0;
    loop {
        let candidate = dir.join(format!("logdata{}.txt", counter));
        if fs::metadata(&candidate).await.is_err() {
            return candidate;
        }
        counter += 1;
    }
}

pub fn header_line(sensor_labels: &[String]) -> String {
    let mut header = String::from("TimeStamp_DateTime");
    for label in sensor_labels.iter().map(String::as_str).chain(CONTROL_COLUMNS) {
        header.push('\t');
        header.push_str(label);
    }
    header
}

/// Values for one row: sensors in configured order, then u, r and the fan flags
pub fn row(snapshot: &TemperatureSnapshot, state: &ControlState) -> Vec<String> {
    let mut values: Vec<String> = snapshot
        .log_values()
        .iter()
        .map(|v| format!("{:.3}", v))
        .collect();
    values.push(format!("{:.3}", state.u));
    values.push(format!("{:.3}", state.r));
    values.push(u8::from(state.stonebed_fan_active).to_string());
    values.push(u8::from(state.main_fan_active).to_string());
    values
}
