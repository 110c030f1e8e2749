mod config;
mod control;
mod datalog;
mod forecast;
mod hardware;
mod models;
mod sensors;
mod tasks;
mod terminal;
mod utils;

use futures_util::future::join_all;
use log::{error, info};
use std::path::Path;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use config::{ClimateConfig, PinConfig};
use control::{ControlLoop, ControlStatus, WindowActuator};
use datalog::DataLogger;
use forecast::ForecastFeed;
use hardware::{
    FeedbackSwitch, GpioBank, GpioRelay, GpioSwitch, L298nDriver, MotorDriver, Relay, SimulatedMotor,
    SimulatedRelay, SimulatedSwitch,
};
use sensors::{SamplingTask, SnapshotReader, W1Bus};
use tasks::{Shutdown, Signal};
use terminal::ManualControl;

/// Delay before the first tick, giving every task time to start
const WARM_UP: Duration = Duration::from_secs(5);

struct Actuators {
    motor: Box<dyn MotorDriver>,
    switch: Box<dyn FeedbackSwitch>,
    main_fan: Box<dyn Relay>,
    stonebed_fan: Box<dyn Relay>,
}

fn build_actuators(pins: &PinConfig, dry_run: bool) -> Result<Actuators, Box<dyn std::error::Error>> {
    if dry_run {
        info!("Dry run: actuators are simulated");
        return Ok(Actuators {
            motor: Box::new(SimulatedMotor::default()),
            switch: Box::new(SimulatedSwitch),
            main_fan: Box::new(SimulatedRelay::new("main fan")),
            stonebed_fan: Box::new(SimulatedRelay::new("stonebed fan")),
        });
    }

    let gpio = GpioBank::new()?;
    let motor = L298nDriver::new(gpio.output(pins.motor_in1)?, gpio.output(pins.motor_in2)?);
    let switch = GpioSwitch::new(gpio.input(pins.window_feedback)?);
    let main_fan = GpioRelay::new("main fan", gpio.output(pins.main_fan)?);
    let stonebed_fan = GpioRelay::new("stonebed fan", gpio.output(pins.stonebed_fan)?);

    Ok(Actuators {
        motor: Box::new(motor),
        switch: Box::new(switch),
        main_fan: Box::new(main_fan),
        stonebed_fan: Box::new(stonebed_fan),
    })
}

/// Periodic driver: log one row, then release the sampling and control tasks
async fn tick_driver(
    time_step: Duration,
    mut logger: DataLogger,
    snapshot: SnapshotReader,
    status: ControlStatus,
    go_sample: Signal,
    go_control: Signal,
    shutdown: Shutdown,
) {
    let mut ticker = interval_at(Instant::now() + WARM_UP, time_step);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut stop = shutdown.clone();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stop.triggered() => break,
        }

        let values = datalog::row(&snapshot.get(), &status.get());
        if let Err(e) = logger.update(&values).await {
            error!("Failed to write data log: {}", e);
        }

        go_sample.post();
        go_control.post();
    }
}

async fn run(config: ClimateConfig) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Shutdown::new();
    let go_sample = Signal::new();
    let go_control = Signal::new();
    let sample_ready = Signal::new();
    let time_step = Duration::from_secs(config.time_step_secs);

    let devices = config.sensors.iter().map(|s| s.device_id.clone()).collect();
    let sampling = SamplingTask::new(W1Bus::new(&config.w1_dir), devices);
    let snapshot = sampling.reader();

    let actuators = build_actuators(&config.pins, config.dry_run)?;
    let window = WindowActuator::new(
        actuators.motor,
        actuators.switch,
        Duration::from_secs(config.window_time_secs),
    );

    let manual = ManualControl::new();
    let forecast = ForecastFeed::new(
        config.prognosis_sources.clone(),
        config.prognosis_items,
        config.downloader.clone(),
    )?;
    let control = ControlLoop::new(
        config.setpoints,
        time_step,
        forecast,
        config.prognosis_items,
        snapshot.clone(),
        window.handle(),
        actuators.main_fan,
        actuators.stonebed_fan,
        manual.clone(),
    );
    let status = control.status();

    let logger = DataLogger::create(
        Path::new(&config.log_dir),
        &config.sensor_labels(),
        config.time_step_secs,
    )
    .await?;
    info!("Logging data to {}", logger.path().display());

    // Handle Ctrl+C gracefully
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Program terminated by user. Shutting down.");
                    shutdown.trigger();
                }
                Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
            }
        });
    }

    let handles = vec![
        tokio::spawn(sampling.run(
            go_sample.clone(),
            sample_ready.clone(),
            shutdown.clone(),
        )),
        tokio::spawn(control.run(window, go_control.clone(), sample_ready, shutdown.clone())),
        tokio::spawn(terminal::run(
            terminal::spawn_stdin_reader(),
            manual,
            shutdown.clone(),
        )),
        tokio::spawn(tick_driver(
            time_step,
            logger,
            snapshot,
            status,
            go_sample,
            go_control,
            shutdown,
        )),
    ];

    for result in join_all(handles).await {
        if let Err(e) = result {
            error!("Task failed: {}", e);
        }
    }

    info!("All tasks stopped, actuators are in their safe state");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match ClimateConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    info!("Starting EcoDome climate control");
    if let Err(e) = run(config).await {
        error!("Fatal error: {}", e);
        return Err(e);
    }

    info!("Program completed successfully");
    Ok(())
}
