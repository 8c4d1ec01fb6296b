//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlCycle (domain)
//! ```
//!
//! Driven adapters (thermistor ADCs, relays, PWM, telemetry sinks, config
//! storage) implement these traits.  The
//! [`ControlCycle`](super::service::ControlCycle) consumes them via
//! generics, so the decision logic never touches hardware directly.

use chrono::NaiveDateTime;

use crate::config::SystemConfig;
use crate::error::{ActuatorError, ConfigError, SensorError, SinkError};
use crate::telemetry::LogRecord;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Raw per-channel thermistor reads.
pub trait RawSensorSource {
    /// Instantaneous voltage on `index` (0-based).  Synchronous.
    fn read_channel(&mut self, index: usize) -> Result<f64, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator ports (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Heater relay.  Called only when the controller actually switches.
pub trait HeaterActuator {
    fn set_power(&mut self, on: bool) -> Result<(), ActuatorError>;
}

/// LED PWM.  Called only when the level changes.
pub trait LightActuator {
    /// `level` is in `0..=1024`.
    fn set_level(&mut self, level: u16) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Telemetry ports (driven adapter: domain → logging / time series)
// ───────────────────────────────────────────────────────────────

/// Time-series destination for [`LogRecord`]s.
///
/// A failed write must leave the batch with the caller; the
/// [`TelemetryBuffer`](crate::telemetry::TelemetryBuffer) keeps it.
pub trait LogSink {
    fn write(&mut self, records: &[LogRecord]) -> Result<(), SinkError>;
}

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

/// Host diagnostics (controller board temperature).
pub trait HostProbe {
    /// Device temperature in °C, `None` when unavailable.
    fn device_temperature(&mut self) -> Option<f64>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before returning or persisting; a
/// malformed config stops startup instead of being silently defaulted.
pub trait ConfigPort {
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Local wall clock.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}
