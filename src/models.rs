/// One complete set of greenhouse temperatures, captured in a single sampling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TemperatureSnapshot {
    pub inside: f32,
    pub window_area: f32,
    pub outside: f32,
    pub outside_mean: f32,
    pub stonebed_1: f32,
    pub stonebed_2: f32,
    pub stonebed_mean: f32,
    pub stonebed_fan_duct: f32,
    pub extra: Option<f32>,
}

impl TemperatureSnapshot {
    /// Build a snapshot from channel readings in configured order.
    ///
    /// Positions: 0 inside, 1 window area, 2 stonebed-fan duct, 3 outside,
    /// 4/5 stonebed close/far, 6 optional extra channel.
    /// Returns None if fewer than six readings are given.
    pub fn from_readings(readings: &[f32]) -> Option<Self> {
        if readings.len() < 6 {
            return None;
        }

        // Only one outside sensor is wired, so it doubles as the mean
        let outside = readings[3];

        Some(TemperatureSnapshot {
            inside: readings[0],
            window_area: readings[1],
            outside,
            outside_mean: outside,
            stonebed_1: readings[4],
            stonebed_2: readings[5],
            stonebed_mean: (readings[4] + readings[5]) / 2.0,
            stonebed_fan_duct: readings[2],
            extra: readings.get(6).copied(),
        })
    }

    /// Values in logger column order (same order as the configured sensors)
    pub fn log_values(&self) -> Vec<f32> {
        let mut values = vec![
            self.inside,
            self.window_area,
            self.stonebed_fan_duct,
            self.outside,
            self.stonebed_1,
            self.stonebed_2,
        ];
        if let Some(extra) = self.extra {
            values.push(extra);
        }
        values
    }
}

/// Controller output and actuator flags, published once per control tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlState {
    /// Control output
    pub u: f32,
    /// Active setpoint
    pub r: f32,
    /// Plant measurement (inside temperature)
    pub y: f32,
    pub main_fan_active: bool,
    pub stonebed_fan_active: bool,
}

/// Where forecast files for one prognosis feed come from and are stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PrognosisSource {
    pub url: String,
    pub file_path: String,
    pub file_name: String,
}

/// One forecast entry as stored by the downloader.
#[derive(Debug, Clone, PartialEq)]
pub struct PrognosisSample {
    pub valid: String,
    pub wind_dir: f32,
    pub wind_speed: f32,
    pub temperature: f32,
    pub air_pressure: f32,
}

impl PrognosisSample {
    pub const ERROR_MARKER: &'static str = "[ERROR!]";

    /// Placeholder used when a forecast file is missing or corrupt
    pub fn fallback() -> Self {
        PrognosisSample {
            valid: Self::ERROR_MARKER.to_string(),
            wind_dir: 0.0,
            wind_speed: 0.0,
            temperature: 0.0,
            air_pressure: 0.0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.valid == Self::ERROR_MARKER
    }
}
