//! In-memory board for host runs and tests.
//!
//! Holds a fixed voltage per channel and records what the controllers
//! asked the actuators to do.  Individual channels can be marked faulty to
//! exercise the "no reading" paths.

use log::debug;

use crate::app::ports::{HeaterActuator, LightActuator, RawSensorSource};
use crate::error::{ActuatorError, SensorError};

#[derive(Debug, Clone)]
pub struct SimulatedBoard {
    voltages: Vec<f64>,
    faulty: Vec<bool>,
    heater_on: Option<bool>,
    light_level: Option<u16>,
    heater_writes: usize,
    light_writes: usize,
}

impl SimulatedBoard {
    /// `channels` inputs, all reading `volts`.
    pub fn new(channels: usize, volts: f64) -> Self {
        Self {
            voltages: vec![volts; channels],
            faulty: vec![false; channels],
            heater_on: None,
            light_level: None,
            heater_writes: 0,
            light_writes: 0,
        }
    }

    pub fn set_voltage(&mut self, channel: usize, volts: f64) {
        if let Some(v) = self.voltages.get_mut(channel) {
            *v = volts;
        }
    }

    pub fn set_all(&mut self, volts: f64) {
        self.voltages.iter_mut().for_each(|v| *v = volts);
    }

    /// A faulty channel fails every read until cleared.
    pub fn set_faulty(&mut self, channel: usize, faulty: bool) {
        if let Some(f) = self.faulty.get_mut(channel) {
            *f = faulty;
        }
    }

    pub fn heater_on(&self) -> Option<bool> {
        self.heater_on
    }

    pub fn light_level(&self) -> Option<u16> {
        self.light_level
    }

    pub fn heater_writes(&self) -> usize {
        self.heater_writes
    }

    pub fn light_writes(&self) -> usize {
        self.light_writes
    }
}

impl RawSensorSource for SimulatedBoard {
    fn read_channel(&mut self, index: usize) -> Result<f64, SensorError> {
        match (self.voltages.get(index), self.faulty.get(index)) {
            (Some(_), Some(true)) => Err(SensorError::AdcReadFailed),
            (Some(v), _) => Ok(*v),
            (None, _) => Err(SensorError::NoSuchChannel),
        }
    }
}

impl HeaterActuator for SimulatedBoard {
    fn set_power(&mut self, on: bool) -> Result<(), ActuatorError> {
        debug!("sim: heater {}", if on { "on" } else { "off" });
        self.heater_on = Some(on);
        self.heater_writes += 1;
        Ok(())
    }
}

impl LightActuator for SimulatedBoard {
    fn set_level(&mut self, level: u16) -> Result<(), ActuatorError> {
        debug!("sim: light {}", level);
        self.light_level = Some(level);
        self.light_writes += 1;
        Ok(())
    }
}
