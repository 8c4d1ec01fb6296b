//! Outbound application events.
//!
//! The [`ControlCycle`](super::service::ControlCycle) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Unlike the per-tick
//! [`LogRecord`](crate::telemetry::LogRecord), events fire only when
//! something notable happens.

use crate::error::ActuatorError;

/// Which actuator an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuator {
    Heater,
    Light,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The control cycle was constructed and is about to tick.
    Started { channels: usize },

    /// The heater relay switched.
    HeaterSwitched { on: bool, median: f64, target: f64 },

    /// The light PWM was written.
    LightChanged { level: u16 },

    /// Every channel was absent or equal to the sentinel; heater skipped.
    NoValidReading { target: f64 },

    /// An actuator write failed; the loop continues.
    ActuatorFault { actuator: Actuator, error: ActuatorError },

    /// Actuators released before exit.
    Shutdown,
}
