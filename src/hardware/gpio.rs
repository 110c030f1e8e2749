/// Raspberry Pi GPIO backends for the relays, window motor and feedback switch
use log::debug;
use rppal::gpio::{Gpio, InputPin, OutputPin};
use std::io;

use super::{FeedbackSwitch, MotorCommand, MotorDriver, Relay};

/// A digital output the drivers can set high or low
pub trait OutputLine: Send {
    fn write_level(&mut self, high: bool);
}

impl OutputLine for OutputPin {
    fn write_level(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }
}

/// A digital input the feedback switch is read from
pub trait InputLine: Send {
    fn reads_low(&self) -> bool;
}

impl InputLine for InputPin {
    fn reads_low(&self) -> bool {
        self.is_low()
    }
}

/// Access to the BCM-numbered GPIO lines of the board
pub struct GpioBank {
    gpio: Gpio,
}

impl GpioBank {
    pub fn new() -> Result<Self, rppal::gpio::Error> {
        Ok(GpioBank { gpio: Gpio::new()? })
    }

    /// Claim `pin` as an output, driven low
    pub fn output(&self, pin: u8) -> Result<OutputPin, rppal::gpio::Error> {
        debug!("Claiming GPIO {} as output", pin);
        Ok(self.gpio.get(pin)?.into_output_low())
    }

    /// Claim `pin` as an input with the internal pull-up enabled
    pub fn input(&self, pin: u8) -> Result<InputPin, rppal::gpio::Error> {
        debug!("Claiming GPIO {} as input", pin);
        Ok(self.gpio.get(pin)?.into_input_pullup())
    }
}

/// L298N bridge channel driven through two direction inputs
#[derive(Debug)]
pub struct L298nDriver<L = OutputPin> {
    in1: L,
    in2: L,
}

impl<L: OutputLine> L298nDriver<L> {
    /// The motor is switched off on construction
    pub fn new(in1: L, in2: L) -> Self {
        let mut driver = L298nDriver { in1, in2 };
        driver.apply(MotorCommand::Off);
        driver
    }

    fn apply(&mut self, command: MotorCommand) {
        let (in1, in2) = command.levels();
        self.in1.write_level(in1);
        self.in2.write_level(in2);
    }
}

impl<L: OutputLine> MotorDriver for L298nDriver<L> {
    fn drive(&mut self, command: MotorCommand) -> io::Result<()> {
        self.apply(command);
        Ok(())
    }
}

/// Relay on a single output line, energized when high
#[derive(Debug)]
pub struct GpioRelay<L = OutputPin> {
    name: &'static str,
    line: L,
}

impl<L: OutputLine> GpioRelay<L> {
    /// The relay is released on construction
    pub fn new(name: &'static str, mut line: L) -> Self {
        line.write_level(false);
        GpioRelay { name, line }
    }
}

impl<L: OutputLine> Relay for GpioRelay<L> {
    fn set(&mut self, energized: bool) -> io::Result<()> {
        debug!("{} relay -> {}", self.name, energized);
        self.line.write_level(energized);
        Ok(())
    }
}

/// Active-low limit switch: the line is pulled low when the window is closed
#[derive(Debug)]
pub struct GpioSwitch<I = InputPin> {
    line: I,
}

impl<I: InputLine> GpioSwitch<I> {
    pub fn new(line: I) -> Self {
        GpioSwitch { line }
    }
}

impl<I: InputLine> FeedbackSwitch for GpioSwitch<I> {
    fn is_closed(&mut self) -> bool {
        self.line.reads_low()
    }
}
