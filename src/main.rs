//! Vivarium controller — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  SimulatedBoard      LogEventSink   JsonConfigFile           │
//! │  (Sensor+Actuators)  (EventSink)    (ConfigPort)             │
//! │  JsonLinesSink       LocalClock     Vcgencmd/ThermalZone     │
//! │  (LogSink)           (Clock)        (HostProbe)              │
//! │  listen_for_stop_signals (SIGINT/SIGTERM → StopFlag)         │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │           ControlCycle (pure logic)                │      │
//! │  │   Aggregator · Heater deadzone · Light curve       │      │
//! │  └────────────────────────────────────────────────────┘      │
//! │                                                              │
//! │  Runner: TelemetryBuffer · Housekeeper · StopFlag            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use vivarium::adapters::config_file::JsonConfigFile;
use vivarium::adapters::host::{NoProbe, ThermalZoneProbe, VcgencmdProbe};
use vivarium::adapters::json_sink::JsonLinesSink;
use vivarium::adapters::log_sink::LogEventSink;
use vivarium::adapters::signal::listen_for_stop_signals;
use vivarium::adapters::sim::SimulatedBoard;
use vivarium::adapters::time::{LocalClock, ThreadDelay};
use vivarium::app::ports::{ConfigPort, HostProbe};
use vivarium::app::service::ControlCycle;
use vivarium::config::SystemConfig;
use vivarium::runner::{Runner, StopFlag};
use vivarium::sensors::calibration::CalibrationTable;

// ── CLI ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProbeKind {
    /// Raspberry Pi `vcgencmd measure_temp`
    Vcgencmd,
    /// `/sys/class/thermal/thermal_zone0/temp`
    ThermalZone,
    /// Do not record a host temperature
    None,
}

#[derive(Parser, Debug)]
#[command(name = "vivarium")]
#[command(about = "Vivarium heater and lighting controller")]
#[command(version)]
struct Args {
    /// Configuration file (JSON); defaults are used when it does not exist
    config: Option<PathBuf>,

    /// Override the calibration table path from the config
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Stop after this many ticks (runs forever when omitted)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
    ticks: Option<u64>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Append telemetry as JSON lines to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Voltage reported on every simulated thermistor channel
    #[arg(long, default_value_t = 1.65)]
    sim_volts: f64,

    /// Source of the controller board temperature
    #[arg(long, value_enum, default_value = "thermal-zone")]
    probe: ProbeKind,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

// ── Host probe selection ──────────────────────────────────────

enum Probe {
    Vcgencmd(VcgencmdProbe),
    ThermalZone(ThermalZoneProbe),
    None(NoProbe),
}

impl From<ProbeKind> for Probe {
    fn from(kind: ProbeKind) -> Self {
        match kind {
            ProbeKind::Vcgencmd => Self::Vcgencmd(VcgencmdProbe),
            ProbeKind::ThermalZone => Self::ThermalZone(ThermalZoneProbe::default()),
            ProbeKind::None => Self::None(NoProbe),
        }
    }
}

impl HostProbe for Probe {
    fn device_temperature(&mut self) -> Option<f64> {
        match self {
            Self::Vcgencmd(p) => p.device_temperature(),
            Self::ThermalZone(p) => p.device_temperature(),
            Self::None(p) => p.device_temperature(),
        }
    }
}

fn build_cycle(config: &SystemConfig) -> vivarium::error::Result<ControlCycle> {
    let table = CalibrationTable::load(&config.sensors.calibration_file)?;
    Ok(ControlCycle::new(config, table)?)
}

// ── Entry point ───────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    info!("vivarium v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Configuration (fail fast) ──────────────────────────
    let mut config = match &args.config {
        Some(path) => JsonConfigFile::new(path)
            .load()
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SystemConfig::default(),
    };
    if let Some(path) = &args.calibration {
        config.sensors.calibration_file = path.clone();
    }

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    // ── 2. Calibration (fail fast) ────────────────────────────
    let cycle = build_cycle(&config).with_context(|| {
        format!(
            "loading calibration {}",
            config.sensors.calibration_file.display()
        )
    })?;

    // ── 3. Adapters ───────────────────────────────────────────
    // Relay and PWM pins (`heater.pins`, `lights.pin`) are opened by a
    // platform build through `RelayHeater::open` / `PwmLight::open`.
    info!(
        "Simulated board: {} channels at {} V, GPIO {:?}/{} not driven",
        config.sensors.channels, args.sim_volts, config.heater.pins, config.lights.pin
    );
    let mut board = SimulatedBoard::new(config.sensors.channels, args.sim_volts);
    let mut delay = ThreadDelay;
    let mut probe = Probe::from(args.probe);
    let mut events = LogEventSink::new();

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening telemetry output {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    let mut sink = JsonLinesSink::new(out);

    // ── 4. Control loop (until --ticks or SIGINT/SIGTERM) ─────
    let stop = StopFlag::new();
    let _signals = listen_for_stop_signals(stop.clone()).context("installing signal handlers")?;
    let mut runner = Runner::new(&config, cycle, stop)
        .context("configuring the control loop")?
        .with_tick_limit(args.ticks);

    let ticks = runner
        .run(
            &mut board,
            &mut delay,
            &mut probe,
            &mut events,
            &LocalClock,
            &mut sink,
        )
        .context("flushing telemetry on shutdown")?;
    info!("Stopped after {} ticks", ticks);
    Ok(())
}
