//! Mock hardware adapter for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO/PWM.  Thermistor voltages are set
//! directly; the shared calibration is linear at 10 °C per volt.

use chrono::{NaiveDate, NaiveDateTime};
use embedded_hal::delay::DelayNs;
use vivarium::app::events::AppEvent;
use vivarium::app::ports::{
    Clock, EventSink, HeaterActuator, HostProbe, LightActuator, RawSensorSource,
};
use vivarium::error::{ActuatorError, SensorError};
use vivarium::sensors::calibration::CalibrationTable;

/// Voltage whose calibrated temperature equals the default sentinel (13 °C).
pub const SENTINEL_VOLTS: f64 = 1.3;

/// `channels` identical linear curves; 1.3 V lands exactly on 13 °C.
pub fn linear_table(channels: usize) -> CalibrationTable {
    let curve = vec![(0.0, 0.0), (SENTINEL_VOLTS, 13.0), (5.0, 50.0)];
    CalibrationTable::from_points(&vec![curve; channels]).unwrap()
}

pub fn volts_for(temp: f64) -> f64 {
    temp / 10.0
}

#[allow(dead_code)]
pub fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCall {
    Heater(bool),
    Light(u16),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub voltages: Vec<f64>,
    pub failing_channels: Vec<usize>,
    pub heater_fails: bool,
    pub light_fails: bool,
    pub calls: Vec<ActuatorCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(channels: usize, temp: f64) -> Self {
        Self {
            voltages: vec![volts_for(temp); channels],
            failing_channels: Vec::new(),
            heater_fails: false,
            light_fails: false,
            calls: Vec::new(),
        }
    }

    pub fn set_temp(&mut self, temp: f64) {
        self.voltages.iter_mut().for_each(|v| *v = volts_for(temp));
    }

    pub fn heater_calls(&self) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Heater(on) => Some(*on),
                _ => None,
            })
            .collect()
    }

    pub fn light_calls(&self) -> Vec<u16> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Light(level) => Some(*level),
                _ => None,
            })
            .collect()
    }

    pub fn heater_on(&self) -> Option<bool> {
        self.heater_calls().last().copied()
    }
}

impl RawSensorSource for MockHardware {
    fn read_channel(&mut self, index: usize) -> Result<f64, SensorError> {
        if self.failing_channels.contains(&index) {
            return Err(SensorError::AdcReadFailed);
        }
        self.voltages
            .get(index)
            .copied()
            .ok_or(SensorError::NoSuchChannel)
    }
}

impl HeaterActuator for MockHardware {
    fn set_power(&mut self, on: bool) -> Result<(), ActuatorError> {
        if self.heater_fails {
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.calls.push(ActuatorCall::Heater(on));
        Ok(())
    }
}

impl LightActuator for MockHardware {
    fn set_level(&mut self, level: u16) -> Result<(), ActuatorError> {
        if self.light_fails {
            return Err(ActuatorError::PwmWriteFailed);
        }
        self.calls.push(ActuatorCall::Light(level));
        Ok(())
    }
}

// ── Delay / probe / clock / events ────────────────────────────

#[derive(Default)]
pub struct NoDelay {
    pub total_ms: u64,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ms += u64::from(ns) / 1_000_000;
    }
}

pub struct FixedProbe(pub Option<f64>);

impl HostProbe for FixedProbe {
    fn device_temperature(&mut self) -> Option<f64> {
        self.0
    }
}

/// Clock frozen at one instant.
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[derive(Default)]
pub struct EventLog {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl EventLog {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
