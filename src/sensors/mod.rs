//! Sensor subsystem — calibration and the aggregating [`SensorAggregator`].
//!
//! The aggregator reads every thermistor channel through a
//! [`RawSensorSource`], converts voltages to °C, and produces a [`Reading`]
//! each tick.  [`aggregate`] then discards detached sensors and reduces the
//! reading to a single median temperature.

pub mod calibration;

use chrono::NaiveDateTime;
use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::app::ports::RawSensorSource;
use crate::config::SensorConfig;
use crate::error::{CalibrationError, SensorError};
use calibration::CalibrationTable;

/// Upper bound on thermistor channels (two 4-channel ADCs).
pub const MAX_CHANNELS: usize = 8;

/// Per-channel temperatures; `None` marks a channel that could not be read.
pub type ChannelValues = heapless::Vec<Option<f64>, MAX_CHANNELS>;

/// One tick's worth of converted sensor values.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub taken_at: NaiveDateTime,
    values: ChannelValues,
}

impl Reading {
    pub fn new(taken_at: NaiveDateTime, values: ChannelValues) -> Self {
        Self { taken_at, values }
    }

    /// Channel values in channel order.
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Number of channels (present or absent).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of reducing a [`Reading`] to one temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    /// Median of the valid values; `None` when no channel is usable.
    pub median: Option<f64>,
    /// How many channels contributed to the median.
    pub valid_count: usize,
}

/// Median by the usual even/odd rule.  Sorts `values` in place.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let n = values.len();
    if n % 2 == 0 {
        Some((values[n / 2 - 1] + values[n / 2]) / 2.0)
    } else {
        Some(values[n / 2])
    }
}

/// Drop absent channels and exact sentinel matches, then take the median.
///
/// The sentinel is compared with `==`: a detached thermistor reads as one
/// specific calibrated value, not a range.
#[allow(clippy::float_cmp)]
pub fn aggregate(reading: &Reading, outlier_sentinel: f64) -> Aggregate {
    let mut valid: heapless::Vec<f64, MAX_CHANNELS> = reading
        .values()
        .iter()
        .flatten()
        .copied()
        .filter(|&t| t != outlier_sentinel)
        .collect();
    Aggregate {
        valid_count: valid.len(),
        median: median(&mut valid),
    }
}

/// Owns the calibration table and turns raw channel reads into [`Reading`]s.
pub struct SensorAggregator {
    calibration: CalibrationTable,
    channels: usize,
    outlier_sentinel: f64,
    samples_per_tick: u32,
    settle_ms: u32,
}

impl SensorAggregator {
    /// Fails if the table does not cover exactly `config.channels` channels.
    pub fn new(
        calibration: CalibrationTable,
        config: &SensorConfig,
    ) -> Result<Self, CalibrationError> {
        if calibration.channels() != config.channels {
            return Err(CalibrationError::ChannelCount {
                expected: config.channels,
                found: calibration.channels(),
            });
        }
        Ok(Self {
            calibration,
            channels: config.channels.min(MAX_CHANNELS),
            outlier_sentinel: config.outlier_sentinel,
            samples_per_tick: config.samples_per_tick.max(1),
            settle_ms: config.settle_ms,
        })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn outlier_sentinel(&self) -> f64 {
        self.outlier_sentinel
    }

    /// Read every channel once.
    ///
    /// A failed channel is logged and left absent.
    pub fn read_all(&self, source: &mut impl RawSensorSource, now: NaiveDateTime) -> Reading {
        let mut values = ChannelValues::new();
        for ch in 0..self.channels {
            // Capacity is MAX_CHANNELS and channels <= MAX_CHANNELS.
            let _ = values.push(self.read_channel(source, ch));
        }
        Reading::new(now, values)
    }

    /// Take the configured number of samples and combine them per channel
    /// by median, sleeping `settle_ms` between samples.
    pub fn read_samples(
        &self,
        source: &mut impl RawSensorSource,
        delay: &mut impl DelayNs,
        now: NaiveDateTime,
    ) -> Reading {
        if self.samples_per_tick <= 1 {
            return self.read_all(source, now);
        }

        let mut per_channel: heapless::Vec<Vec<f64>, MAX_CHANNELS> = (0..self.channels)
            .map(|_| Vec::with_capacity(self.samples_per_tick as usize))
            .collect();

        for sample in 0..self.samples_per_tick {
            if sample > 0 {
                delay.delay_ms(self.settle_ms);
            }
            for (ch, bucket) in per_channel.iter_mut().enumerate() {
                if let Some(t) = self.read_channel(source, ch) {
                    bucket.push(t);
                }
            }
        }

        let values = per_channel
            .iter_mut()
            .map(|bucket| median(bucket))
            .collect();
        debug!(
            "Combined {} samples across {} channels",
            self.samples_per_tick, self.channels
        );
        Reading::new(now, values)
    }

    /// Median of `reading` with this aggregator's sentinel.
    pub fn aggregate(&self, reading: &Reading) -> Aggregate {
        aggregate(reading, self.outlier_sentinel)
    }

    fn read_channel(&self, source: &mut impl RawSensorSource, ch: usize) -> Option<f64> {
        let volts = match source.read_channel(ch) {
            Ok(v) if v.is_finite() => v,
            Ok(_) => {
                warn!("Sensor ch{}: {}", ch, SensorError::NonFinite);
                return None;
            }
            Err(e) => {
                warn!("Sensor ch{}: {}", ch, e);
                return None;
            }
        };
        match self.calibration.temperature_for(ch, volts) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!("Sensor ch{}: {}", ch, e);
                None
            }
        }
    }
}
