//! Daylight curve for the LED strip.
//!
//! Between sunrise and sunset the level follows `sin(p·π)³` where `p` is the
//! fraction of the day elapsed: a slow dawn, a broad midday plateau, and a
//! slow dusk.  Outside that window the light is off.  The PWM is written
//! only when the rounded level changes.

use core::f64::consts::PI;
use std::time::Duration;

use chrono::{NaiveTime, Timelike};

use crate::app::ports::LightActuator;
use crate::error::ActuatorError;

/// Full-scale PWM level.
pub const MAX_LEVEL: u16 = 1024;

/// Sunrise and sunset as offsets from local midnight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightCycleParams {
    pub sunrise: Duration,
    pub sunset: Duration,
}

impl LightCycleParams {
    /// Build from fractional hours of day.
    pub fn from_hours(sunrise_hour: f64, sunset_hour: f64) -> Self {
        Self {
            sunrise: Duration::from_secs_f64(sunrise_hour.max(0.0) * 3600.0),
            sunset: Duration::from_secs_f64(sunset_hour.max(0.0) * 3600.0),
        }
    }
}

/// Fraction of the lit day elapsed at `time`; 0 outside `[sunrise, sunset]`.
pub fn day_proportion(time: NaiveTime, params: &LightCycleParams) -> f64 {
    let now = f64::from(time.num_seconds_from_midnight())
        + f64::from(time.nanosecond()) / 1_000_000_000.0;
    let sunrise = params.sunrise.as_secs_f64();
    let sunset = params.sunset.as_secs_f64();
    if now < sunrise || now > sunset || sunset <= sunrise {
        return 0.0;
    }
    (now - sunrise) / (sunset - sunrise)
}

/// PWM level (0..=1024) for `time`.
pub fn brightness(time: NaiveTime, params: &LightCycleParams) -> u16 {
    let factor = (day_proportion(time, params) * PI).sin().powi(3).max(0.0);
    (f64::from(MAX_LEVEL) * factor)
        .round()
        .clamp(0.0, f64::from(MAX_LEVEL)) as u16
}

/// Outcome of one light update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightUpdate {
    pub level: u16,
    /// Whether the PWM was written this tick.
    pub changed: bool,
}

/// Owns the last level written to the hardware.
pub struct LightController {
    cycle: LightCycleParams,
    last_level: Option<u16>,
}

impl LightController {
    pub fn new(cycle: LightCycleParams) -> Self {
        Self {
            cycle,
            last_level: None,
        }
    }

    /// Last level successfully written, `None` before the first write.
    pub fn level(&self) -> Option<u16> {
        self.last_level
    }

    /// Compute the level for `time` and write it if it changed.
    ///
    /// On a failed write the stored level is left as-is so the next tick
    /// retries.
    pub fn update(
        &mut self,
        time: NaiveTime,
        actuator: &mut impl LightActuator,
    ) -> Result<LightUpdate, ActuatorError> {
        let level = brightness(time, &self.cycle);
        if self.last_level == Some(level) {
            return Ok(LightUpdate {
                level,
                changed: false,
            });
        }
        actuator.set_level(level)?;
        self.last_level = Some(level);
        Ok(LightUpdate {
            level,
            changed: true,
        })
    }
}
