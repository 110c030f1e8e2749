//! Actuator and switch interfaces, with Raspberry Pi GPIO and simulated backends

pub mod gpio;
pub mod simulated;

use std::io;

pub use gpio::{GpioBank, GpioRelay, GpioSwitch, L298nDriver};
pub use simulated::{SimulatedMotor, SimulatedRelay, SimulatedSwitch};

/// Direction command for an H-bridge driven motor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCommand {
    /// Both inputs low, motor coasts
    Off,
    Forward,
    Reverse,
    /// Both inputs high, motor is held
    Brake,
}

impl MotorCommand {
    /// Levels of the two driver inputs (IN1, IN2)
    pub fn levels(self) -> (bool, bool) {
        match self {
            MotorCommand::Off => (false, false),
            MotorCommand::Forward => (true, false),
            MotorCommand::Reverse => (false, true),
            MotorCommand::Brake => (true, true),
        }
    }
}

pub trait MotorDriver: Send {
    fn drive(&mut self, command: MotorCommand) -> io::Result<()>;
}

pub trait Relay: Send {
    fn set(&mut self, energized: bool) -> io::Result<()>;
}

pub trait FeedbackSwitch: Send {
    /// True when the switch reports the window fully closed
    fn is_closed(&mut self) -> bool;
}
