/// Stand-in actuators for running without GPIO (dry run)
use log::info;
use std::io;

use super::{FeedbackSwitch, MotorCommand, MotorDriver, Relay};

#[derive(Debug, Default)]
pub struct SimulatedMotor {
    last: Option<MotorCommand>,
}

impl MotorDriver for SimulatedMotor {
    fn drive(&mut self, command: MotorCommand) -> io::Result<()> {
        // The actuator re-issues its command every sub-tick; only report changes
        if self.last != Some(command) {
            info!("[dry run] window motor -> {:?}", command);
            self.last = Some(command);
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct SimulatedRelay {
    name: &'static str,
    energized: Option<bool>,
}

impl SimulatedRelay {
    pub fn new(name: &'static str) -> Self {
        SimulatedRelay {
            name,
            energized: None,
        }
    }
}

impl Relay for SimulatedRelay {
    fn set(&mut self, energized: bool) -> io::Result<()> {
        if self.energized != Some(energized) {
            info!("[dry run] {} relay -> {}", self.name, if energized { "on" } else { "off" });
            self.energized = Some(energized);
        }
        Ok(())
    }
}

/// Switch that never reports closed, so closing always runs the full travel time
#[derive(Debug, Default)]
pub struct SimulatedSwitch;

impl FeedbackSwitch for SimulatedSwitch {
    fn is_closed(&mut self) -> bool {
        false
    }
}
