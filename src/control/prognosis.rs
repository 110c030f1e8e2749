/// Setpoint biasing from the weather forecast
use log::warn;

use crate::config::Setpoints;
use crate::models::PrognosisSample;

#[derive(Debug, Clone, Copy)]
pub struct PrognosisAnalyzer {
    setpoints: Setpoints,
}

impl PrognosisAnalyzer {
    pub fn new(setpoints: Setpoints) -> Self {
        PrognosisAnalyzer { setpoints }
    }

    /// Compute the setpoint for the coming period
    ///
    /// Looks at forecast entry `sample_index - 1` (the index is one-based).
    /// When the forecast is warmer than the maximum minus the current
    /// inside/outside margin the setpoint is lowered, when it is colder than the
    /// minimum plus the margin it is raised, otherwise the desired temperature
    /// is returned. The corrections only push back from the floor/ceiling when
    /// within half a degree of it.
    pub fn analyze(
        &self,
        samples: &[PrognosisSample],
        inside: f32,
        outside_mean: f32,
        sample_index: usize,
    ) -> f32 {
        let Setpoints { t_max, t_min, t_des } = self.setpoints;

        let forecast = match sample_index.checked_sub(1).and_then(|i| samples.get(i)) {
            Some(sample) => sample.temperature,
            None => {
                warn!(
                    "Prognosis entry {} not available ({} loaded), keeping desired temperature",
                    sample_index,
                    samples.len()
                );
                return t_des;
            }
        };

        let margin = inside - outside_mean;

        if forecast > t_max - margin {
            let result = t_des - ((t_max - margin) + forecast);
            if result < t_min + 0.5 {
                t_min + 1.0
            } else {
                result
            }
        } else if forecast < t_min + margin {
            let result = t_des + ((t_min + margin) - forecast);
            if result > t_max - 0.5 {
                t_max - 1.0
            } else {
                result
            }
        } else {
            t_des
        }
    }
}
