//! Heater controller — day-cycle setpoint with a two-band deadzone.
//!
//! The target follows a cosine over 24 h: lowest at `coldest_hour`, highest
//! twelve hours later.  The relay is switched only when the measured median
//! is outside the temperature band **and** the last switch is older than the
//! time band; either band alone holds the current state.
//!
//! ```text
//!   Unknown ──(first decision, always)──▶ On / Off
//!   On  ◀──(outside both deadzones)──▶ Off
//! ```

use core::f64::consts::PI;

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::app::ports::HeaterActuator;
use crate::error::ActuatorError;

/// Relay power as far as the controller knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PowerState {
    /// Not yet commanded (startup) or last command failed.
    #[default]
    Unknown,
    On,
    Off,
}

impl PowerState {
    pub fn from_power(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }

    /// `Some(true)` for On, `Some(false)` for Off, `None` while unknown.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Unknown => None,
            Self::On => Some(true),
            Self::Off => Some(false),
        }
    }
}

/// Persistent heater state, owned by [`HeaterController`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeaterState {
    pub power: PowerState,
    /// When the relay last actually switched.
    pub last_change: Option<NaiveDateTime>,
}

/// Cosine day-cycle curve parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayCycleParams {
    pub avg_temp: f64,
    pub delta_temp: f64,
    pub coldest_hour: f64,
}

/// Hysteresis bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadzoneParams {
    pub temp_threshold: f64,
    pub time_threshold_secs: f64,
}

/// Target temperature at `time` on the day-cycle curve.
pub fn target_temperature(time: NaiveTime, params: &DayCycleParams) -> f64 {
    let hour = f64::from(time.hour()) + f64::from(time.minute()) / 60.0;
    let angle = (hour - params.coldest_hour).rem_euclid(24.0) / 12.0 * PI;
    params.avg_temp - params.delta_temp * angle.cos()
}

/// Why a decision left the relay alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    /// Already in the desired state.
    AlreadySet,
    /// Median is within `temp_threshold` of the target.
    TempDeadzone,
    /// Last switch was less than `time_threshold_secs` ago.
    TimeDeadzone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerDecision {
    /// Drive the relay to this power.
    Switch(bool),
    Hold(HoldReason),
}

/// Heater state machine.
pub struct HeaterController {
    day_cycle: DayCycleParams,
    deadzone: DeadzoneParams,
    state: HeaterState,
}

impl HeaterController {
    pub fn new(day_cycle: DayCycleParams, deadzone: DeadzoneParams) -> Self {
        Self {
            day_cycle,
            deadzone,
            state: HeaterState::default(),
        }
    }

    pub fn state(&self) -> HeaterState {
        self.state
    }

    pub fn power(&self) -> PowerState {
        self.state.power
    }

    /// Target temperature at `time` for this controller's day cycle.
    pub fn target_temperature(&self, time: NaiveTime) -> f64 {
        target_temperature(time, &self.day_cycle)
    }

    /// Decide without side effects.
    pub fn decide(&self, median: f64, target: f64, now: NaiveDateTime) -> PowerDecision {
        let desired = median < target;

        // First decision always lands, whatever the deadzones say.
        if self.state.power == PowerState::Unknown {
            return PowerDecision::Switch(desired);
        }
        if self.state.power == PowerState::from_power(desired) {
            return PowerDecision::Hold(HoldReason::AlreadySet);
        }

        if (median - target).abs() < self.deadzone.temp_threshold {
            return PowerDecision::Hold(HoldReason::TempDeadzone);
        }
        if let Some(last) = self.state.last_change {
            // A clock stepping backwards yields a negative interval, which
            // stays inside the band until wall time catches up.
            let since = (now - last).num_milliseconds() as f64 / 1000.0;
            if since < self.deadzone.time_threshold_secs {
                return PowerDecision::Hold(HoldReason::TimeDeadzone);
            }
        }

        PowerDecision::Switch(desired)
    }

    /// Decide and, on a switch, drive the actuator exactly once.
    ///
    /// A failed actuator write drops the state back to `Unknown`, so the
    /// next tick re-applies without waiting out the deadzone.
    pub fn update(
        &mut self,
        median: f64,
        target: f64,
        now: NaiveDateTime,
        actuator: &mut impl HeaterActuator,
    ) -> Result<PowerDecision, ActuatorError> {
        let decision = self.decide(median, target, now);
        if let PowerDecision::Switch(on) = decision {
            if let Err(e) = actuator.set_power(on) {
                self.state.power = PowerState::Unknown;
                return Err(e);
            }
            self.state = HeaterState {
                power: PowerState::from_power(on),
                last_change: Some(now),
            };
        }
        Ok(decision)
    }
}
