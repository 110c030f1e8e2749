/// Threshold bands that turn the control output into actuator commands
use crate::config::Setpoints;
use crate::models::TemperatureSnapshot;

/// Drive level at which the window is opened
const WINDOW_BAND: f32 = 20.0;
/// Drive level at which the main fan runs as well
const FAN_BAND: f32 = 40.0;
/// Drive level at which the stonebed is used regardless of setpoint bias
const STONEBED_BAND: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCommand {
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorDecision {
    pub window: WindowCommand,
    /// Ventilation mode (window open), logged as the main-fan flag
    pub main_fan_active: bool,
    pub main_fan_relay: bool,
    pub stonebed_relay: bool,
}

/// Decide actuator states from output `u`, setpoint `r` and the latest readings
///
/// All band comparisons are strict.
pub fn decide(u: f32, r: f32, snapshot: &TemperatureSnapshot, setpoints: &Setpoints) -> ActuatorDecision {
    let inside = snapshot.inside;

    let (window, main_fan_active, main_fan_relay) =
        if u > WINDOW_BAND && snapshot.outside_mean > inside {
            // warmer outside and heat wanted
            (WindowCommand::Open, true, u > FAN_BAND)
        } else if u < -WINDOW_BAND || inside > setpoints.t_max {
            (WindowCommand::Open, true, u < -FAN_BAND)
        } else {
            (WindowCommand::Close, false, false)
        };

    let stonebed_colder = snapshot.stonebed_mean < inside;
    let stonebed_warmer = snapshot.stonebed_mean > inside;
    let stonebed_relay = ((r > setpoints.t_des || u < -STONEBED_BAND) && stonebed_colder)
        || ((r < setpoints.t_des || u > STONEBED_BAND) && stonebed_warmer);

    ActuatorDecision {
        window,
        main_fan_active,
        main_fan_relay,
        stonebed_relay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETPOINTS: Setpoints = Setpoints {
        t_max: 30.0,
        t_min: 10.0,
        t_des: 20.0,
    };

    fn snapshot(inside: f32, outside: f32, stonebed: f32) -> TemperatureSnapshot {
        TemperatureSnapshot {
            inside,
            outside,
            outside_mean: outside,
            stonebed_1: stonebed,
            stonebed_2: stonebed,
            stonebed_mean: stonebed,
            ..Default::default()
        }
    }

    #[test]
    fn heating_band_is_exclusive_at_twenty() {
        let warm_outside = snapshot(18.0, 25.0, 18.0);

        let at_band = decide(20.0, 20.0, &warm_outside, &SETPOINTS);
        assert_eq!(at_band.window, WindowCommand::Close);
        assert!(!at_band.main_fan_active);

        let above = decide(20.01, 20.0, &warm_outside, &SETPOINTS);
        assert_eq!(above.window, WindowCommand::Open);
        assert!(above.main_fan_active);
        assert!(!above.main_fan_relay);
    }

    #[test]
    fn heating_fan_band_is_exclusive_at_forty() {
        let warm_outside = snapshot(18.0, 25.0, 18.0);
        assert!(!decide(40.0, 20.0, &warm_outside, &SETPOINTS).main_fan_relay);
        assert!(decide(40.5, 20.0, &warm_outside, &SETPOINTS).main_fan_relay);
    }

    #[test]
    fn heating_needs_warmer_outside() {
        let cold_outside = snapshot(18.0, 10.0, 18.0);
        let decision = decide(50.0, 20.0, &cold_outside, &SETPOINTS);
        assert_eq!(decision.window, WindowCommand::Close);
        assert!(!decision.main_fan_relay);
    }

    #[test]
    fn cooling_band_is_exclusive_at_minus_twenty_and_forty() {
        let reading = snapshot(22.0, 15.0, 22.0);

        assert_eq!(decide(-20.0, 20.0, &reading, &SETPOINTS).window, WindowCommand::Close);

        let open = decide(-20.5, 20.0, &reading, &SETPOINTS);
        assert_eq!(open.window, WindowCommand::Open);
        assert!(!open.main_fan_relay);

        assert!(!decide(-40.0, 20.0, &reading, &SETPOINTS).main_fan_relay);
        assert!(decide(-40.5, 20.0, &reading, &SETPOINTS).main_fan_relay);
    }

    #[test]
    fn over_maximum_opens_window_without_fan() {
        let hot = snapshot(31.0, 15.0, 31.0);
        let decision = decide(0.0, 20.0, &hot, &SETPOINTS);
        assert_eq!(decision.window, WindowCommand::Open);
        assert!(decision.main_fan_active);
        assert!(!decision.main_fan_relay);
    }

    #[test]
    fn stonebed_absorbs_heat_when_cooling_is_wanted() {
        // raised setpoint, stonebed colder than inside
        assert!(decide(0.0, 22.0, &snapshot(25.0, 15.0, 18.0), &SETPOINTS).stonebed_relay);
        // strong negative drive, stonebed colder than inside
        assert!(decide(-6.0, 20.0, &snapshot(25.0, 15.0, 18.0), &SETPOINTS).stonebed_relay);
        // neutral setpoint and drive
        assert!(!decide(-5.0, 20.0, &snapshot(25.0, 15.0, 18.0), &SETPOINTS).stonebed_relay);
    }

    #[test]
    fn stonebed_releases_heat_when_heating_is_wanted() {
        assert!(decide(0.0, 18.0, &snapshot(15.0, 10.0, 20.0), &SETPOINTS).stonebed_relay);
        assert!(decide(6.0, 20.0, &snapshot(15.0, 10.0, 20.0), &SETPOINTS).stonebed_relay);
        // drive says heat but the stonebed is colder
        assert!(!decide(6.0, 20.0, &snapshot(15.0, 10.0, 12.0), &SETPOINTS).stonebed_relay);
    }

    #[test]
    fn stonebed_idle_at_equal_temperature() {
        assert!(!decide(-30.0, 25.0, &snapshot(20.0, 10.0, 20.0), &SETPOINTS).stonebed_relay);
    }
}
