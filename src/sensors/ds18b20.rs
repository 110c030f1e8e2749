/// DS18B20 one-wire temperature channel read through the kernel w1 driver
use log::warn;
use std::future::Future;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncReadExt;

/// Reading reported when the device file cannot be opened
pub const OPEN_FAILURE_READING: f32 = 1.0;
/// Reading reported when the device file cannot be read or parsed
pub const READ_FAILURE_READING: f32 = 0.0;

/// Source of single temperature readings, keyed by device identifier
pub trait TemperatureSource: Send + Sync {
    /// Read one channel; failures yield a sentinel reading, never an error
    fn read(&self, device: &str) -> impl Future<Output = f32> + Send;
}

/// Decode the `w1_slave` text, e.g. `... crc=5a YES\n... t=21562` -> 21.562
pub fn parse_w1_slave(contents: &str) -> Option<f32> {
    let start = contents.find("t=")? + 2;
    let digits: String = contents[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    digits.parse::<i32>().ok().map(|milli| milli as f32 / 1000.0)
}

#[derive(Debug, Clone)]
pub struct W1Bus {
    devices_dir: PathBuf,
}

impl W1Bus {
    pub fn new(devices_dir: impl Into<PathBuf>) -> Self {
        W1Bus {
            devices_dir: devices_dir.into(),
        }
    }

    fn slave_path(&self, device: &str) -> PathBuf {
        self.devices_dir.join(device).join("w1_slave")
    }
}

impl TemperatureSource for W1Bus {
    async fn read(&self, device: &str) -> f32 {
        let path = self.slave_path(device);

        let mut file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) => {
                warn!("Failed to open {}: {}", path.display(), e);
                return OPEN_FAILURE_READING;
            }
        };

        let mut contents = String::new();
        if let Err(e) = file.read_to_string(&mut contents).await {
            warn!("Failed to read {}: {}", path.display(), e);
            return READ_FAILURE_READING;
        }

        match parse_w1_slave(&contents) {
            Some(temperature) => temperature,
            None => {
                warn!("No temperature in {}: {:?}", path.display(), contents.trim());
                READ_FAILURE_READING
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n72 01 4b 46 7f ff 0e 10 57 t=23125\n";

    #[test]
    fn parses_millidegrees() {
        assert_eq!(parse_w1_slave(SAMPLE), Some(23.125));
    }

    #[test]
    fn parses_negative_values() {
        assert_eq!(parse_w1_slave("00 : crc=00 YES\n00 t=-1250\n"), Some(-1.25));
    }

    #[test]
    fn rejects_text_without_temperature() {
        assert_eq!(parse_w1_slave("00 : crc=00 NO\n"), None);
        assert_eq!(parse_w1_slave("t=\n"), None);
    }

    #[tokio::test]
    async fn reads_device_file_and_reports_sentinels() {
        let dir = std::env::temp_dir().join(format!("ecodome-w1-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("28-good")).unwrap();
        std::fs::write(dir.join("28-good/w1_slave"), SAMPLE).unwrap();
        std::fs::create_dir_all(dir.join("28-garbled")).unwrap();
        std::fs::write(dir.join("28-garbled/w1_slave"), "garbage").unwrap();

        let bus = W1Bus::new(&dir);
        assert_eq!(bus.read("28-good").await, 23.125);
        assert_eq!(bus.read("28-missing").await, OPEN_FAILURE_READING);
        assert_eq!(bus.read("28-garbled").await, READ_FAILURE_READING);
    }
}
