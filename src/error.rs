//! Unified error types for the vivarium controller.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! startup path's error handling uniform.  Two categories exist:
//!
//! - **Fatal** (`Config`, `Calibration`) — returned before the control loop
//!   starts; the process refuses to run with bad parameters.
//! - **Recoverable** (`Sensor`, `Actuator`, `Sink`) — surfaced to the loop,
//!   logged, and never abort a tick.
//!
//! "No valid reading" is not an error: it is the `None` arm of
//! [`Aggregate::median`](crate::sensors::Aggregate) and is handled as
//! ordinary control flow.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// Calibration data is invalid or could not be loaded.
    Calibration(CalibrationError),
    /// A sensor channel could not be read.
    Sensor(SensorError),
    /// An actuator command failed.
    Actuator(ActuatorError),
    /// The telemetry sink rejected a batch.
    Sink(SinkError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Calibration(e) => write!(f, "calibration: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Sink(e) => write!(f, "sink: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from loading or validating [`SystemConfig`](crate::config::SystemConfig).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The config file could not be read or written.
    Io(String),
    /// The config document is not valid JSON or has unknown / mistyped keys.
    Parse(String),
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Calibration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalibrationError {
    /// The calibration file could not be read.
    Io(String),
    /// The calibration document is not valid JSON or has the wrong shape.
    Parse(String),
    /// A channel has fewer than two calibration points.
    TooFewPoints { channel: usize },
    /// A channel's voltage column length differs from the temperature column.
    LengthMismatch { channel: usize },
    /// A voltage or temperature is NaN or infinite.
    NonFinite { channel: usize },
    /// Voltages are neither strictly ascending nor strictly descending.
    NotMonotonic { channel: usize },
    /// No calibration exists for the requested channel.
    UnknownChannel { channel: usize },
    /// Table channel count does not match the configured sensor count.
    ChannelCount { expected: usize, found: usize },
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::TooFewPoints { channel } => {
                write!(f, "channel {channel}: fewer than 2 points")
            }
            Self::LengthMismatch { channel } => {
                write!(f, "channel {channel}: voltage/temperature length mismatch")
            }
            Self::NonFinite { channel } => write!(f, "channel {channel}: non-finite value"),
            Self::NotMonotonic { channel } => {
                write!(f, "channel {channel}: voltages not strictly monotonic")
            }
            Self::UnknownChannel { channel } => write!(f, "no calibration for channel {channel}"),
            Self::ChannelCount { expected, found } => {
                write!(f, "expected {expected} channels, table has {found}")
            }
        }
    }
}

impl std::error::Error for CalibrationError {}

impl From<CalibrationError> for Error {
    fn from(e: CalibrationError) -> Self {
        Self::Calibration(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error or timed out.
    AdcReadFailed,
    /// The raw value is NaN or infinite.
    NonFinite,
    /// Channel index is beyond what the source provides.
    NoSuchChannel,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::NonFinite => write!(f, "non-finite raw value"),
            Self::NoSuchChannel => write!(f, "no such channel"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
    /// GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl std::error::Error for ActuatorError {}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Sink errors
// ---------------------------------------------------------------------------

/// Telemetry write failures.  Never fatal: the batch stays buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The underlying writer failed.
    Io(String),
    /// A record could not be encoded.
    Encode(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "write failed: {msg}"),
            Self::Encode(msg) => write!(f, "encode failed: {msg}"),
        }
    }
}

impl std::error::Error for SinkError {}

impl From<SinkError> for Error {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
