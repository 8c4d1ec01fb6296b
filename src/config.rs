//! System configuration parameters
//!
//! All tunable parameters for the vivarium controller.  Values come from an
//! optional JSON file; every field has a default, so a file only needs to
//! name what it overrides.  [`SystemConfig::validate`] runs before the
//! control loop starts and rejects anything out of range.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::control::heater::{DayCycleParams, DeadzoneParams};
use crate::control::light::LightCycleParams;
use crate::error::ConfigError;
use crate::sensors::MAX_CHANNELS;

/// Longest accepted control tick (one day).
pub const MAX_TICK_SECS: f64 = 86_400.0;

/// Upper bound on every housekeeping age setting (100 years).
pub const MAX_RETENTION_DAYS: u32 = 36_500;

const BAD_TICK: &str = "tick_interval_secs must be in (0, 86400]";

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SystemConfig {
    /// Control tick interval (seconds)
    pub tick_interval_secs: f64,
    pub heater: HeaterConfig,
    pub lights: LightConfig,
    pub sensors: SensorConfig,
    pub data: DataConfig,
    pub housekeeping: HousekeepingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaterConfig {
    /// Relay GPIO pins (BCM numbering), all switched together.  Opened by
    /// [`RelayHeater::open`](crate::adapters::hardware::RelayHeater::open);
    /// the simulated board has no pins and ignores them.
    pub pins: Vec<u8>,
    /// Relays close when the pin is driven low
    pub active_low: bool,
    pub deadzone: DeadzoneConfig,
    pub daycycle: DayCycleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeadzoneConfig {
    /// Temperature band (°C) inside which the heater is not switched
    pub temp: f64,
    /// Minimum seconds between heater switches
    pub time_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DayCycleConfig {
    /// Mean target temperature (°C)
    pub avg_temp: f64,
    /// Amplitude of the daily swing (°C)
    pub delta_temp: f64,
    /// Hour of day (0-24) with the lowest target
    pub coldest_hour: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightConfig {
    /// PWM GPIO pin (BCM numbering), opened by
    /// [`PwmLight::open`](crate::adapters::hardware::PwmLight::open)
    pub pin: u8,
    /// Hour of day (0-24, fractional allowed) the light starts rising
    pub sunrise_hour: f64,
    /// Hour of day (0-24, fractional allowed) the light is fully off again
    pub sunset_hour: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorConfig {
    /// Number of thermistor channels
    pub channels: usize,
    /// Converted temperature that marks a detached sensor
    pub outlier_sentinel: f64,
    /// Samples taken per tick (combined by per-channel median)
    pub samples_per_tick: u32,
    /// Settle delay between samples (milliseconds)
    pub settle_ms: u32,
    /// Calibration table location
    pub calibration_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Measurement name stamped on every log record
    pub measurement_name: String,
    /// Value of the `run` tag
    pub run_id: String,
    /// Records held while the sink is failing
    pub backlog: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HousekeepingConfig {
    pub enabled: bool,
    /// Directory whose subdirectories hold recorded `.mp4` files
    pub video_root: PathBuf,
    /// Run the cleanup every N ticks
    pub interval_ticks: u32,
    /// Files younger than this are never touched
    pub min_age_hours: f64,
    /// Daytime window (hours) whose recordings are removed
    pub day_start_hour: u32,
    pub day_end_hour: u32,
    /// Recordings smaller than this are removed
    pub min_size_bytes: u64,
    /// Recordings older than this are removed
    pub max_age_days: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 10.0,
            heater: HeaterConfig::default(),
            lights: LightConfig::default(),
            sensors: SensorConfig::default(),
            data: DataConfig::default(),
            housekeeping: HousekeepingConfig::default(),
        }
    }
}

impl Default for HeaterConfig {
    fn default() -> Self {
        Self {
            pins: vec![17, 27],
            active_low: true,
            deadzone: DeadzoneConfig::default(),
            daycycle: DayCycleConfig::default(),
        }
    }
}

impl Default for DeadzoneConfig {
    fn default() -> Self {
        Self {
            temp: 0.1,
            time_secs: 180.0,
        }
    }
}

impl Default for DayCycleConfig {
    fn default() -> Self {
        Self {
            avg_temp: 26.0,
            delta_temp: 2.0,
            coldest_hour: 2.0,
        }
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            pin: 18,
            sunrise_hour: 6.0,
            sunset_hour: 20.0,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            channels: 4,
            outlier_sentinel: 13.0,
            samples_per_tick: 1,
            settle_ms: 1000,
            calibration_file: PathBuf::from("./data/thermistors.json"),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            measurement_name: "vivarium2".into(),
            run_id: "v1".into(),
            backlog: 360, // 1 h at 10 s ticks
        }
    }
}

impl Default for HousekeepingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            video_root: PathBuf::from("/var/www/html/sierpinski"),
            interval_ticks: 360,
            min_age_hours: 1.0,
            day_start_hour: 6,
            day_end_hour: 22,
            min_size_bytes: 1_000_000,
            max_age_days: 14,
        }
    }
}

impl SystemConfig {
    /// Parse a (possibly partial) JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the control loop misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        use ConfigError::ValidationFailed as Invalid;

        self.tick_interval()?;

        // --- Heater ---
        let h = &self.heater;
        if h.pins.is_empty() {
            return Err(Invalid("heater.pins must name at least one pin"));
        }
        if !(h.deadzone.temp.is_finite() && h.deadzone.temp >= 0.0) {
            return Err(Invalid("heater.deadzone.temp must be >= 0"));
        }
        if !(h.deadzone.time_secs.is_finite() && h.deadzone.time_secs >= 0.0) {
            return Err(Invalid("heater.deadzone.time_secs must be >= 0"));
        }
        if !h.daycycle.avg_temp.is_finite() {
            return Err(Invalid("heater.daycycle.avg_temp must be finite"));
        }
        if !(h.daycycle.delta_temp.is_finite() && h.daycycle.delta_temp >= 0.0) {
            return Err(Invalid("heater.daycycle.delta_temp must be >= 0"));
        }
        if !(0.0..24.0).contains(&h.daycycle.coldest_hour) {
            return Err(Invalid("heater.daycycle.coldest_hour must be in 0..24"));
        }

        // --- Lights ---
        let l = &self.lights;
        if !(0.0..=24.0).contains(&l.sunrise_hour) || !(0.0..=24.0).contains(&l.sunset_hour) {
            return Err(Invalid("lights.sunrise_hour/sunset_hour must be in 0..=24"));
        }
        if l.sunrise_hour >= l.sunset_hour {
            return Err(Invalid("lights.sunrise_hour must be before sunset_hour"));
        }

        // --- Sensors ---
        let s = &self.sensors;
        if s.channels == 0 || s.channels > MAX_CHANNELS {
            return Err(Invalid("sensors.channels must be in 1..=8"));
        }
        if !s.outlier_sentinel.is_finite() {
            return Err(Invalid("sensors.outlier_sentinel must be finite"));
        }
        if s.samples_per_tick == 0 {
            return Err(Invalid("sensors.samples_per_tick must be >= 1"));
        }

        // --- Data ---
        if self.data.measurement_name.is_empty() {
            return Err(Invalid("data.measurement_name must not be empty"));
        }
        if self.data.backlog == 0 {
            return Err(Invalid("data.backlog must be >= 1"));
        }

        // --- Housekeeping ---
        let k = &self.housekeeping;
        if k.enabled {
            if k.interval_ticks == 0 {
                return Err(Invalid("housekeeping.interval_ticks must be >= 1"));
            }
            if k.day_start_hour > 24 || k.day_end_hour > 24 || k.day_start_hour > k.day_end_hour {
                return Err(Invalid("housekeeping day window must satisfy start <= end <= 24"));
            }
            if k.max_age_days > MAX_RETENTION_DAYS {
                return Err(Invalid("housekeeping.max_age_days must be <= 36500"));
            }
            let max_hours = f64::from(MAX_RETENTION_DAYS) * 24.0;
            if !(0.0..=max_hours).contains(&k.min_age_hours) {
                return Err(Invalid("housekeeping.min_age_hours must be in 0..=876000"));
            }
        }

        Ok(())
    }

    /// Tick period.  Fails instead of panicking on a config that skipped
    /// [`validate`](Self::validate).
    pub fn tick_interval(&self) -> Result<Duration, ConfigError> {
        match Duration::try_from_secs_f64(self.tick_interval_secs) {
            Ok(d) if !d.is_zero() && self.tick_interval_secs <= MAX_TICK_SECS => Ok(d),
            _ => Err(ConfigError::ValidationFailed(BAD_TICK)),
        }
    }

    pub fn day_cycle(&self) -> DayCycleParams {
        let d = &self.heater.daycycle;
        DayCycleParams {
            avg_temp: d.avg_temp,
            delta_temp: d.delta_temp,
            coldest_hour: d.coldest_hour,
        }
    }

    pub fn deadzone(&self) -> DeadzoneParams {
        DeadzoneParams {
            temp_threshold: self.heater.deadzone.temp,
            time_threshold_secs: self.heater.deadzone.time_secs,
        }
    }

    pub fn light_cycle(&self) -> LightCycleParams {
        LightCycleParams::from_hours(self.lights.sunrise_hour, self.lights.sunset_hour)
    }
}
