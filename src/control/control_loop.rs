/// Per-tick control: prognosis setpoint, PI law, actuator policy
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::controller::PiController;
use super::policy::{decide, ActuatorDecision, WindowCommand};
use super::prognosis::PrognosisAnalyzer;
use super::window::{WindowActuator, WindowHandle};
use crate::config::Setpoints;
use crate::forecast::ForecastFeed;
use crate::hardware::Relay;
use crate::models::{ControlState, PrognosisSample, TemperatureSnapshot};
use crate::sensors::SnapshotReader;
use crate::tasks::{Shutdown, Signal};
use crate::terminal::{ManualControl, WindowOverride};
use crate::utils::ticks_in;

/// How often the prognosis is refreshed and the setpoint re-derived
pub const PROGNOSIS_INTERVAL: Duration = Duration::from_secs(1800);

fn lock(state: &Mutex<ControlState>) -> MutexGuard<'_, ControlState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Read access to the published controller state, for the data logger
#[derive(Debug, Clone)]
pub struct ControlStatus {
    state: Arc<Mutex<ControlState>>,
}

impl ControlStatus {
    pub fn get(&self) -> ControlState {
        *lock(&self.state)
    }
}

pub struct ControlLoop {
    setpoints: Setpoints,
    controller: PiController,
    analyzer: PrognosisAnalyzer,
    forecast: ForecastFeed,
    prognosis_index: usize,
    prognosis_period: u32,
    ticks_since_prognosis: u32,
    prognosis: Vec<PrognosisSample>,
    r: f32,
    snapshot: SnapshotReader,
    window: WindowHandle,
    main_fan: Box<dyn Relay>,
    stonebed_fan: Box<dyn Relay>,
    manual: ManualControl,
    state: Arc<Mutex<ControlState>>,
    last_decision: Option<ActuatorDecision>,
}

impl ControlLoop {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        setpoints: Setpoints,
        time_step: Duration,
        forecast: ForecastFeed,
        prognosis_index: usize,
        snapshot: SnapshotReader,
        window: WindowHandle,
        main_fan: Box<dyn Relay>,
        stonebed_fan: Box<dyn Relay>,
        manual: ManualControl,
    ) -> Self {
        let prognosis_period = ticks_in(PROGNOSIS_INTERVAL, time_step);
        ControlLoop {
            setpoints,
            controller: PiController::new(),
            analyzer: PrognosisAnalyzer::new(setpoints),
            forecast,
            prognosis_index,
            prognosis_period,
            // First tick derives a setpoint straight away
            ticks_since_prognosis: prognosis_period,
            prognosis: Vec::new(),
            r: setpoints.t_des,
            snapshot,
            window,
            main_fan,
            stonebed_fan,
            manual,
            state: Arc::new(Mutex::new(ControlState {
                r: setpoints.t_des,
                ..Default::default()
            })),
            last_decision: None,
        }
    }

    pub fn status(&self) -> ControlStatus {
        ControlStatus {
            state: Arc::clone(&self.state),
        }
    }

    /// Tick loop: go-control, optional prognosis refresh, wait for sample-ready, control
    pub async fn run(
        mut self,
        window: WindowActuator,
        go_control: Signal,
        sample_ready: Signal,
        shutdown: Shutdown,
    ) {
        let window_task = tokio::spawn(window.run(shutdown.clone()));
        info!(
            "Control loop started (setpoint {:.1}, prognosis every {} ticks)",
            self.r, self.prognosis_period
        );

        while go_control.wait_or_shutdown(&shutdown).await {
            let prognosis_due = self.ticks_since_prognosis >= self.prognosis_period;
            if prognosis_due {
                let mut stop = shutdown.clone();
                tokio::select! {
                    samples = self.forecast.refresh() => self.prognosis = samples.to_vec(),
                    _ = stop.triggered() => break,
                }
            }

            if !sample_ready.wait_or_shutdown(&shutdown).await {
                break;
            }
            let snapshot = self.snapshot.get();

            if prognosis_due {
                self.update_setpoint(&snapshot);
                self.ticks_since_prognosis = 0;
            }
            self.ticks_since_prognosis += 1;

            self.tick(&snapshot);
        }

        self.stop_relays();
        if let Err(e) = window_task.await {
            warn!("Window actuator task failed: {}", e);
        }
        info!("Control loop stopped");
    }

    /// Re-derive the setpoint from the loaded prognosis
    pub fn update_setpoint(&mut self, snapshot: &TemperatureSnapshot) {
        let degraded = self
            .prognosis
            .get(self.prognosis_index.saturating_sub(1))
            .map_or(false, PrognosisSample::is_fallback);
        if degraded {
            warn!("Prognosis item {} unavailable, using fallback forecast", self.prognosis_index);
        }

        let r = self.analyzer.analyze(
            &self.prognosis,
            snapshot.inside,
            snapshot.outside_mean,
            self.prognosis_index,
        );
        if r != self.r {
            info!("Setpoint changed from {:.2} to {:.2}", self.r, r);
        }
        self.r = r;
    }

    /// One control step on `snapshot`: PI law, actuator policy, publication
    pub fn tick(&mut self, snapshot: &TemperatureSnapshot) -> ActuatorDecision {
        let y = snapshot.inside;
        let u = self.controller.update(self.r, y);
        let decision = decide(u, self.r, snapshot, &self.setpoints);

        let window = match self.manual.window() {
            WindowOverride::Auto => decision.window,
            WindowOverride::Open => WindowCommand::Open,
            WindowOverride::Closed => WindowCommand::Close,
        };
        match window {
            WindowCommand::Open => self.window.open(),
            WindowCommand::Close => self.window.close(),
        }

        set_relay(self.main_fan.as_mut(), "main fan", decision.main_fan_relay);
        set_relay(self.stonebed_fan.as_mut(), "stonebed fan", decision.stonebed_relay);

        if self.last_decision != Some(decision) {
            info!(
                "u={:.2} r={:.2} y={:.2}: window {:?}, main fan {}, stonebed fan {}",
                u,
                self.r,
                y,
                window,
                on_off(decision.main_fan_relay),
                on_off(decision.stonebed_relay)
            );
            self.last_decision = Some(decision);
        } else {
            debug!(
                "u={:.2} r={:.2} y={:.2} window {:?}",
                u,
                self.r,
                y,
                self.window.state().phase()
            );
        }

        *lock(&self.state) = ControlState {
            u,
            r: self.r,
            y,
            main_fan_active: decision.main_fan_active,
            stonebed_fan_active: decision.stonebed_relay,
        };

        decision
    }

    fn stop_relays(&mut self) {
        set_relay(self.main_fan.as_mut(), "main fan", false);
        set_relay(self.stonebed_fan.as_mut(), "stonebed fan", false);
        let mut state = lock(&self.state);
        state.main_fan_active = false;
        state.stonebed_fan_active = false;
    }
}

fn set_relay(relay: &mut dyn Relay, name: &str, energized: bool) {
    if let Err(e) = relay.set(energized) {
        warn!("Failed to switch {} relay: {}", name, e);
    }
}

fn on_off(energized: bool) -> &'static str {
    if energized {
        "on"
    } else {
        "off"
    }
}
