/// Window motor state machine: timed travel with a closed-side limit switch
use log::{info, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::{sleep, Duration};

use crate::hardware::{FeedbackSwitch, MotorCommand, MotorDriver};
use crate::tasks::Shutdown;
use crate::utils::ticks_in;

/// Motion granularity while the window is travelling
pub const SUB_TICK: Duration = Duration::from_millis(100);
/// Poll interval while there is nothing to do
const IDLE_POLL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    Idle,
    MovingOpen,
    MovingClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    /// Requested direction: true is open
    pub open: bool,
    /// A requested motion has not finished yet
    pub pending: bool,
    /// Sub-ticks driven in the current (or last) motion
    pub elapsed_ticks: u32,
}

impl WindowState {
    pub fn phase(&self) -> WindowPhase {
        match (self.pending, self.open) {
            (false, _) => WindowPhase::Idle,
            (true, true) => WindowPhase::MovingOpen,
            (true, false) => WindowPhase::MovingClosed,
        }
    }
}

fn lock(state: &Mutex<WindowState>) -> MutexGuard<'_, WindowState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Request side of the actuator, held by the control loop
#[derive(Debug, Clone)]
pub struct WindowHandle {
    state: Arc<Mutex<WindowState>>,
}

impl WindowHandle {
    pub fn open(&self) {
        let mut state = lock(&self.state);
        if !state.open {
            state.open = true;
            state.pending = true;
            state.elapsed_ticks = 0;
        }
    }

    pub fn close(&self) {
        let mut state = lock(&self.state);
        if state.open {
            state.open = false;
            state.pending = true;
            state.elapsed_ticks = 0;
        }
    }

    pub fn state(&self) -> WindowState {
        *lock(&self.state)
    }
}

pub struct WindowActuator {
    state: Arc<Mutex<WindowState>>,
    motor: Box<dyn MotorDriver>,
    switch: Box<dyn FeedbackSwitch>,
    budget_ticks: u32,
}

impl WindowActuator {
    /// The window is assumed open and at rest on startup
    pub fn new(
        motor: Box<dyn MotorDriver>,
        switch: Box<dyn FeedbackSwitch>,
        travel_time: Duration,
    ) -> Self {
        WindowActuator {
            state: Arc::new(Mutex::new(WindowState {
                open: true,
                pending: false,
                elapsed_ticks: 0,
            })),
            motor,
            switch,
            budget_ticks: ticks_in(travel_time, SUB_TICK),
        }
    }

    pub fn handle(&self) -> WindowHandle {
        WindowHandle {
            state: Arc::clone(&self.state),
        }
    }

    pub fn budget_ticks(&self) -> u32 {
        self.budget_ticks
    }

    /// Run motions until shutdown, then leave the window open and the motor off
    pub async fn run(mut self, shutdown: Shutdown) {
        let mut stop = shutdown.clone();
        info!(
            "Window actuator ready, travel budget {:.1}s",
            self.budget_ticks() as f32 * SUB_TICK.as_secs_f32()
        );

        while !shutdown.is_triggered() {
            let pause = if self.step() { SUB_TICK } else { IDLE_POLL };
            tokio::select! {
                _ = sleep(pause) => {}
                _ = stop.triggered() => {}
            }
        }

        self.fail_safe_open().await;
    }

    /// Advance the current motion by one sub-tick; returns true while moving
    ///
    /// The state lock is not held while the switch or motor is accessed. A
    /// request that arrives in between is picked up on the next sub-tick.
    fn step(&mut self) -> bool {
        let (open, elapsed) = {
            let state = lock(&self.state);
            if !state.pending {
                return false;
            }
            (state.open, state.elapsed_ticks)
        };

        let closed = !open && self.switch.is_closed();
        if closed || elapsed >= self.budget_ticks {
            drive(self.motor.as_mut(), MotorCommand::Brake);
            let mut state = lock(&self.state);
            if state.open == open && state.elapsed_ticks == elapsed {
                state.pending = false;
                info!(
                    "Window {} after {:.1}s{}",
                    if open { "opened" } else { "closed" },
                    elapsed as f32 * SUB_TICK.as_secs_f32(),
                    if closed { " (feedback switch)" } else { "" }
                );
            }
            return false;
        }

        drive(
            self.motor.as_mut(),
            if open {
                MotorCommand::Forward
            } else {
                MotorCommand::Reverse
            },
        );
        let mut state = lock(&self.state);
        if state.open == open && state.elapsed_ticks == elapsed {
            state.elapsed_ticks += 1;
        }
        true
    }

    async fn fail_safe_open(&mut self) {
        info!("Shutting down, opening window");
        {
            let mut state = lock(&self.state);
            state.open = true;
            state.pending = true;
            state.elapsed_ticks = 0;
        }

        drive(self.motor.as_mut(), MotorCommand::Forward);
        for _ in 0..self.budget_ticks {
            sleep(SUB_TICK).await;
            lock(&self.state).elapsed_ticks += 1;
        }
        drive(self.motor.as_mut(), MotorCommand::Off);

        lock(&self.state).pending = false;
    }
}

fn drive(motor: &mut dyn MotorDriver, command: MotorCommand) {
    if let Err(e) = motor.drive(command) {
        warn!("Failed to drive window motor ({:?}): {}", command, e);
    }
}
