/// PI-style control law over a windowed history of inside temperatures
use log::debug;

use super::history::{BoundedHistoryBuffer, BufferError};

/// Number of inside-temperature samples the integral term is taken over
pub const HISTORY_LEN: usize = 10;

const GAIN: f32 = 1.2;
const INTEGRAL_GAIN: f32 = 0.32;
const SAMPLE_TIME: f32 = 10.0;
const INTEGRAL_SCALE: f32 = 10.0;

#[derive(Debug, Clone)]
pub struct PiController {
    history: BoundedHistoryBuffer<f32, HISTORY_LEN>,
    k: f32,
    ke: f32,
    ts: f32,
}

impl PiController {
    pub fn new() -> Self {
        PiController {
            history: BoundedHistoryBuffer::new(),
            k: GAIN,
            ke: INTEGRAL_GAIN,
            ts: SAMPLE_TIME,
        }
    }

    /// Record `y` and return the control output for reference `r`
    pub fn update(&mut self, r: f32, y: f32) -> f32 {
        if let Err(BufferError::Overflow) = self.history.push(y) {
            // Window is full: drop the oldest sample and retry
            if let Err(e) = self.history.pop().and_then(|_| self.history.push(y)) {
                unreachable!("history window out of step after overflow: {}", e);
            }
        }

        let integral =
            (HISTORY_LEN as f32 * r - self.history.sum()) * INTEGRAL_SCALE * self.ts;
        let u = self.k * (r - y) + (self.ke / self.ts) * integral;

        debug!(
            "controller: r={:.2} y={:.2} integral={:.1} u={:.2} ({} samples)",
            r,
            y,
            integral,
            u,
            self.history.len()
        );
        u
    }
}

impl Default for PiController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn output_at_setpoint_with_full_window_is_zero() {
        let mut controller = PiController::new();
        let mut u = f32::NAN;
        for _ in 0..HISTORY_LEN {
            u = controller.update(20.0, 20.0);
        }
        assert!(close(u, 0.0));
    }

    #[test]
    fn steady_error_combines_both_terms() {
        let mut controller = PiController::new();
        let mut u = f32::NAN;
        for _ in 0..25 {
            u = controller.update(20.0, 19.0);
        }
        // 1.2 * 1 + 0.032 * (200 - 190) * 100
        assert!(close(u, 33.2));
        assert_eq!(controller.history.len(), HISTORY_LEN);
    }

    #[test]
    fn filling_window_counts_empty_slots_as_error() {
        let mut controller = PiController::new();
        // one sample: (200 - 20) * 100 * 0.032 = 576
        assert!(close(controller.update(20.0, 20.0), 576.0));
        assert_eq!(controller.history.len(), 1);
    }

    #[test]
    fn window_only_remembers_recent_samples() {
        let mut controller = PiController::new();
        for _ in 0..HISTORY_LEN {
            controller.update(20.0, 30.0);
        }
        let mut u = f32::NAN;
        for _ in 0..HISTORY_LEN {
            u = controller.update(20.0, 20.0);
        }
        assert!(close(u, 0.0));
    }
}
