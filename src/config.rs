use log::{debug, info};
use std::env;
use std::str::FromStr;
use url::Url;

use crate::models::PrognosisSource;

const DEFAULT_TIME_STEP_SECS: u64 = 10;
const DEFAULT_WINDOW_TIME_SECS: u64 = 30;
const DEFAULT_PROGNOSIS_ITEMS: usize = 1;
const PROGNOSIS_FILE_NAME: &str = "wdat";
const MIN_SENSOR_COUNT: usize = 6;

/// Temperature bounds the controller works within
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setpoints {
    pub t_max: f32,
    pub t_min: f32,
    pub t_des: f32,
}

/// A one-wire device and the column label used for it in the data log
#[derive(Debug, Clone, PartialEq)]
pub struct SensorChannel {
    pub device_id: String,
    pub label: String,
}

/// GPIO lines (BCM numbering) of the actuators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinConfig {
    pub motor_in1: u8,
    pub motor_in2: u8,
    pub window_feedback: u8,
    pub main_fan: u8,
    pub stonebed_fan: u8,
}

#[derive(Debug, Clone)]
pub struct ClimateConfig {
    pub setpoints: Setpoints,
    pub sensors: Vec<SensorChannel>,
    pub prognosis_sources: Vec<PrognosisSource>,
    pub prognosis_items: usize,
    pub time_step_secs: u64,
    pub window_time_secs: u64,
    pub w1_dir: String,
    pub log_dir: String,
    pub downloader: Option<String>,
    pub pins: PinConfig,
    pub dry_run: bool,
}

impl ClimateConfig {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        let setpoints = Setpoints {
            t_max: required_number("ECODOME_T_MAX")?,
            t_min: required_number("ECODOME_T_MIN")?,
            t_des: required_number("ECODOME_T_DES")?,
        };
        validate_setpoints(&setpoints)?;
        info!(
            "Setpoints are max: {}, des: {}, min: {}",
            setpoints.t_max, setpoints.t_des, setpoints.t_min
        );

        let sensors = parse_sensor_list(
            &env::var("ECODOME_SENSORS").map_err(|_| "ECODOME_SENSORS environment variable not set")?,
        )?;
        for sensor in &sensors {
            debug!("Sensor: {} -> {}", sensor.device_id, sensor.label);
        }

        let data_dir = env::var("ECODOME_DATA_DIR").unwrap_or_else(|_| "./data".to_string());
        let prognosis_sources = parse_prognosis_sources(
            &env::var("ECODOME_PROGNOSIS_SOURCES")
                .map_err(|_| "ECODOME_PROGNOSIS_SOURCES environment variable not set")?,
            &data_dir,
        )?;
        info!("Found {} prognosis dataset(s)", prognosis_sources.len());

        let prognosis_items = optional_number("ECODOME_PROGNOSIS_ITEMS", DEFAULT_PROGNOSIS_ITEMS)?;
        if prognosis_items == 0 {
            return Err("ECODOME_PROGNOSIS_ITEMS must be at least 1".into());
        }

        let time_step_secs = optional_number("ECODOME_TIME_STEP", DEFAULT_TIME_STEP_SECS)?;
        if time_step_secs == 0 {
            return Err("ECODOME_TIME_STEP must be at least 1 second".into());
        }

        let pins = PinConfig {
            motor_in1: optional_number("ECODOME_PIN_MOTOR_IN1", 13)?,
            motor_in2: optional_number("ECODOME_PIN_MOTOR_IN2", 19)?,
            window_feedback: optional_number("ECODOME_PIN_WINDOW_FEEDBACK", 21)?,
            main_fan: optional_number("ECODOME_PIN_MAIN_FAN", 0)?,
            stonebed_fan: optional_number("ECODOME_PIN_STONEBED_FAN", 26)?,
        };

        Ok(ClimateConfig {
            setpoints,
            sensors,
            prognosis_sources,
            prognosis_items,
            time_step_secs,
            window_time_secs: optional_number("ECODOME_WINDOW_TIME", DEFAULT_WINDOW_TIME_SECS)?,
            w1_dir: env::var("ECODOME_W1_DIR").unwrap_or_else(|_| "/sys/bus/w1/devices".to_string()),
            log_dir: env::var("ECODOME_LOG_DIR").unwrap_or_else(|_| "./logs".to_string()),
            downloader: env::var("ECODOME_DOWNLOADER").ok().filter(|s| !s.trim().is_empty()),
            pins,
            dry_run: parse_flag(&env::var("ECODOME_DRY_RUN").unwrap_or_default()),
        })
    }

    /// Labels of the sensor columns, in configured order
    pub fn sensor_labels(&self) -> Vec<String> {
        self.sensors.iter().map(|s| s.label.clone()).collect()
    }
}

fn required_number<T: FromStr>(key: &str) -> Result<T, Box<dyn std::error::Error>> {
    let raw = env::var(key).map_err(|_| format!("{} environment variable not set", key))?;
    raw.trim()
        .parse()
        .map_err(|_| format!("{} is not a valid number: '{}'", key, raw).into())
}

fn optional_number<T: FromStr>(key: &str, default: T) -> Result<T, Box<dyn std::error::Error>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("{} is not a valid number: '{}'", key, raw).into()),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

pub fn validate_setpoints(setpoints: &Setpoints) -> Result<(), String> {
    if !(setpoints.t_min < setpoints.t_des && setpoints.t_des < setpoints.t_max) {
        return Err(format!(
            "Setpoints must satisfy min < des < max (got min={}, des={}, max={})",
            setpoints.t_min, setpoints.t_des, setpoints.t_max
        ));
    }
    Ok(())
}

/// Parse `device=label` pairs, keeping their order
pub fn parse_sensor_list(raw: &str) -> Result<Vec<SensorChannel>, String> {
    let mut sensors = Vec::new();

    for pair in raw.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (device_id, label) = pair
            .split_once('=')
            .ok_or_else(|| format!("Sensor entry '{}' is not in device=label form", pair))?;
        let device_id = device_id.trim();
        let label = label.trim();
        if device_id.is_empty() || label.is_empty() {
            return Err(format!("Sensor entry '{}' has an empty device or label", pair));
        }
        sensors.push(SensorChannel {
            device_id: device_id.to_string(),
            label: label.to_string(),
        });
    }

    if sensors.len() < MIN_SENSOR_COUNT {
        return Err(format!(
            "At least {} sensors are required (inside, window, stonebed fan, outside, stonebed close, stonebed far), found {}",
            MIN_SENSOR_COUNT,
            sensors.len()
        ));
    }

    Ok(sensors)
}

/// Turn a comma-separated URL list into download descriptors under `data_dir`
pub fn parse_prognosis_sources(raw: &str, data_dir: &str) -> Result<Vec<PrognosisSource>, String> {
    let data_dir = data_dir.trim_end_matches('/');
    let mut sources = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let url = Url::parse(entry).map_err(|e| format!("Invalid prognosis URL '{}': {}", entry, e))?;
        sources.push(PrognosisSource {
            url: url.to_string(),
            file_path: format!("{}/dataset{}/", data_dir, sources.len() + 1),
            file_name: PROGNOSIS_FILE_NAME.to_string(),
        });
    }

    if sources.is_empty() {
        return Err(
            "No datasets registered, please specify where to take prognosis from".to_string(),
        );
    }

    Ok(sources)
}
