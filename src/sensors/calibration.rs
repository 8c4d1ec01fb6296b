//! Thermistor calibration table.
//!
//! Each channel maps ADC voltage to temperature through a piecewise-linear
//! curve.  The on-disk format shares one temperature column across all
//! channels:
//!
//! ```json
//! { "temps": [10.0, 20.0, 30.0], "voltages": [[...], [...], [...], [...]] }
//! ```
//!
//! Thermistor dividers usually produce *falling* voltage as temperature
//! rises, so a strictly descending voltage column is accepted and reversed
//! on load.  Lookups outside the calibrated range extrapolate along the
//! nearest segment.

use std::fs;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::error::CalibrationError;

/// One channel's curve, voltages strictly ascending.
#[derive(Debug, Clone, PartialEq)]
struct Curve {
    volts: Vec<f64>,
    temps: Vec<f64>,
}

impl Curve {
    fn new(
        channel: usize,
        mut volts: Vec<f64>,
        mut temps: Vec<f64>,
    ) -> Result<Self, CalibrationError> {
        if volts.len() != temps.len() {
            return Err(CalibrationError::LengthMismatch { channel });
        }
        if volts.len() < 2 {
            return Err(CalibrationError::TooFewPoints { channel });
        }
        if volts.iter().chain(temps.iter()).any(|v| !v.is_finite()) {
            return Err(CalibrationError::NonFinite { channel });
        }

        let ascending = volts.windows(2).all(|w| w[0] < w[1]);
        let descending = volts.windows(2).all(|w| w[0] > w[1]);
        if descending {
            volts.reverse();
            temps.reverse();
        } else if !ascending {
            return Err(CalibrationError::NotMonotonic { channel });
        }

        Ok(Self { volts, temps })
    }

    #[allow(clippy::float_cmp)]
    fn interpolate(&self, voltage: f64) -> f64 {
        let v = &self.volts;
        let t = &self.temps;
        let idx = v.partition_point(|&x| x < voltage);
        if idx < v.len() && v[idx] == voltage {
            return t[idx];
        }
        // Segment [lo, lo + 1]; the edge segments extend past the table.
        let lo = idx.clamp(1, v.len() - 1) - 1;
        let slope = (t[lo + 1] - t[lo]) / (v[lo + 1] - v[lo]);
        t[lo] + (voltage - v[lo]) * slope
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CalibrationFile {
    temps: Vec<f64>,
    voltages: Vec<Vec<f64>>,
}

/// Immutable per-channel voltage→temperature table.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    curves: Vec<Curve>,
}

impl CalibrationTable {
    /// Build from per-channel `(voltage, temperature)` points.
    pub fn from_points(channels: &[Vec<(f64, f64)>]) -> Result<Self, CalibrationError> {
        let curves = channels
            .iter()
            .enumerate()
            .map(|(ch, points)| {
                let (volts, temps) = points.iter().copied().unzip();
                Curve::new(ch, volts, temps)
            })
            .collect::<Result<Vec<_>, _>>()?;
        if curves.is_empty() {
            return Err(CalibrationError::ChannelCount {
                expected: 1,
                found: 0,
            });
        }
        Ok(Self { curves })
    }

    /// Parse the shared-temperature JSON format.
    pub fn from_json(json: &str) -> Result<Self, CalibrationError> {
        let file: CalibrationFile =
            serde_json::from_str(json).map_err(|e| CalibrationError::Parse(e.to_string()))?;
        if file.voltages.is_empty() {
            return Err(CalibrationError::ChannelCount {
                expected: 1,
                found: 0,
            });
        }
        let curves = file
            .voltages
            .into_iter()
            .enumerate()
            .map(|(ch, volts)| Curve::new(ch, volts, file.temps.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { curves })
    }

    /// Read and parse a calibration file.
    pub fn load(path: &Path) -> Result<Self, CalibrationError> {
        let json = fs::read_to_string(path)
            .map_err(|e| CalibrationError::Io(format!("{}: {e}", path.display())))?;
        let table = Self::from_json(&json)?;
        info!(
            "Calibration loaded from {} ({} channels)",
            path.display(),
            table.channels()
        );
        Ok(table)
    }

    /// Number of calibrated channels.
    pub fn channels(&self) -> usize {
        self.curves.len()
    }

    /// Temperature (°C) for `voltage` on `channel`.
    pub fn temperature_for(&self, channel: usize, voltage: f64) -> Result<f64, CalibrationError> {
        self.curves
            .get(channel)
            .map(|c| c.interpolate(voltage))
            .ok_or(CalibrationError::UnknownChannel { channel })
    }
}
