//! Control cycle — the hexagonal core.
//!
//! [`ControlCycle`] owns the sensor aggregator and both controllers.  Each
//! call to [`run_once`](ControlCycle::run_once) is one complete tick; all
//! I/O flows through port traits passed in at the call site, so the whole
//! cycle is testable with mock adapters.
//!
//! ```text
//!  RawSensorSource ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                      │         ControlCycle         │
//!   HeaterActuator ◀── │ Aggregator · Heater · Light  │ ──▶ LogRecord
//!    LightActuator ◀── └──────────────────────────────┘
//! ```

use chrono::NaiveDateTime;
use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::control::heater::{HeaterController, PowerDecision, PowerState};
use crate::control::light::LightController;
use crate::error::CalibrationError;
use crate::sensors::SensorAggregator;
use crate::sensors::calibration::CalibrationTable;
use crate::telemetry::LogRecord;

use super::events::{Actuator, AppEvent};
use super::ports::{EventSink, HeaterActuator, HostProbe, LightActuator, RawSensorSource};

// ───────────────────────────────────────────────────────────────
// ControlCycle
// ───────────────────────────────────────────────────────────────

/// Ties sensors, heater and light together once per tick.
///
/// Holds no mutable state of its own beyond what the heater and light
/// controllers keep.
pub struct ControlCycle {
    sensors: SensorAggregator,
    heater: HeaterController,
    light: LightController,
    measurement: String,
    run_id: String,
}

impl ControlCycle {
    /// Build from validated configuration and a loaded calibration table.
    pub fn new(
        config: &SystemConfig,
        calibration: CalibrationTable,
    ) -> Result<Self, CalibrationError> {
        Ok(Self {
            sensors: SensorAggregator::new(calibration, &config.sensors)?,
            heater: HeaterController::new(config.day_cycle(), config.deadzone()),
            light: LightController::new(config.light_cycle()),
            measurement: config.data.measurement_name.clone(),
            run_id: config.data.run_id.clone(),
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started {
            channels: self.sensors.channels(),
        });
        info!(
            "ControlCycle started ({} channels, sentinel {})",
            self.sensors.channels(),
            self.sensors.outlier_sentinel()
        );
    }

    /// Turn the heater off and the light down before the process exits.
    pub fn shutdown(
        &mut self,
        hw: &mut (impl HeaterActuator + LightActuator),
        sink: &mut impl EventSink,
    ) {
        if let Err(e) = hw.set_power(false) {
            warn!("Shutdown: heater off failed: {}", e);
        }
        if let Err(e) = hw.set_level(0) {
            warn!("Shutdown: light off failed: {}", e);
        }
        sink.emit(&AppEvent::Shutdown);
        info!("Actuators released");
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle: read sensors → heater → light → record.
    ///
    /// The `hw` parameter satisfies the sensor and both actuator ports,
    /// which avoids a double mutable borrow while keeping the port boundary
    /// explicit.  Nothing here is fatal: sensor, actuator and "no data"
    /// conditions are logged, emitted, and the record is still produced.
    pub fn run_once(
        &mut self,
        now: NaiveDateTime,
        hw: &mut (impl RawSensorSource + HeaterActuator + LightActuator),
        delay: &mut impl DelayNs,
        probe: &mut impl HostProbe,
        sink: &mut impl EventSink,
    ) -> LogRecord {
        // 1. Sensors
        let reading = self.sensors.read_samples(hw, delay, now);
        let aggregate = self.sensors.aggregate(&reading);

        // 2. Heater
        let target = self.heater.target_temperature(now.time());
        match aggregate.median {
            Some(median) => match self.heater.update(median, target, now, hw) {
                Ok(PowerDecision::Switch(on)) => {
                    info!(
                        "Heater {} (median {:.2}, target {:.2})",
                        if on { "ON" } else { "OFF" },
                        median,
                        target
                    );
                    sink.emit(&AppEvent::HeaterSwitched { on, median, target });
                }
                Ok(PowerDecision::Hold(reason)) => {
                    debug!("Heater hold: {:?}", reason);
                }
                Err(error) => {
                    warn!("Heater actuator failed: {}", error);
                    sink.emit(&AppEvent::ActuatorFault {
                        actuator: Actuator::Heater,
                        error,
                    });
                }
            },
            None => {
                warn!("No valid temperature readings");
                sink.emit(&AppEvent::NoValidReading { target });
            }
        }

        // 3. Light
        match self.light.update(now.time(), hw) {
            Ok(update) if update.changed => {
                debug!("Light level {}/1024", update.level);
                sink.emit(&AppEvent::LightChanged {
                    level: update.level,
                });
            }
            Ok(_) => {}
            Err(error) => {
                warn!("Light actuator failed: {}", error);
                sink.emit(&AppEvent::ActuatorFault {
                    actuator: Actuator::Light,
                    error,
                });
            }
        }

        // 4. Record
        let mut record = LogRecord::new(&self.measurement, &self.run_id, now);
        for (ch, value) in reading.values().iter().enumerate() {
            if let Some(t) = value {
                record.insert(format!("temp{ch}"), *t);
            }
        }
        if let Some(median) = aggregate.median {
            record.insert("temp_avg", median);
        }
        record.insert("valid_sensors", aggregate.valid_count as i64);
        if let Some(on) = self.heater.power().as_bool() {
            record.insert("heater_state", on);
        }
        record.insert("target_temp", target);
        if let Some(level) = self.light.level() {
            record.insert("light", i64::from(level));
        }
        if let Some(t) = probe.device_temperature() {
            record.insert("temp_host", t);
        }
        record
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn heater_power(&self) -> PowerState {
        self.heater.power()
    }

    pub fn light_level(&self) -> Option<u16> {
        self.light.level()
    }
}
