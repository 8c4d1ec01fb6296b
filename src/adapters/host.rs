//! Controller board temperature probes.
//!
//! - [`VcgencmdProbe`] — Raspberry Pi firmware query, `temp=48.3'C`.
//! - [`ThermalZoneProbe`] — Linux sysfs thermal zone, millidegrees.
//! - [`NoProbe`] — always `None`, for boards without either.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use log::debug;

use crate::app::ports::HostProbe;

pub const THERMAL_ZONE0: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Parse `vcgencmd measure_temp` output.
pub fn parse_vcgencmd(output: &str) -> Option<f64> {
    let value = output.trim().strip_prefix("temp=")?;
    let value = value.trim_end_matches(['C', '\'', '\u{00b0}']);
    value.parse::<f64>().ok().filter(|t| t.is_finite())
}

/// Parse a sysfs thermal zone reading (integer millidegrees).
pub fn parse_millidegrees(text: &str) -> Option<f64> {
    text.trim()
        .parse::<i64>()
        .ok()
        .map(|milli| milli as f64 / 1000.0)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct VcgencmdProbe;

impl HostProbe for VcgencmdProbe {
    fn device_temperature(&mut self) -> Option<f64> {
        let output = match Command::new("vcgencmd").arg("measure_temp").output() {
            Ok(o) if o.status.success() => o,
            Ok(o) => {
                debug!("vcgencmd exited with {}", o.status);
                return None;
            }
            Err(e) => {
                debug!("vcgencmd unavailable: {}", e);
                return None;
            }
        };
        let text = String::from_utf8_lossy(&output.stdout);
        let parsed = parse_vcgencmd(&text);
        if parsed.is_none() {
            debug!("Unexpected vcgencmd output: {:?}", text.trim());
        }
        parsed
    }
}

#[derive(Debug, Clone)]
pub struct ThermalZoneProbe {
    path: PathBuf,
}

impl ThermalZoneProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ThermalZoneProbe {
    fn default() -> Self {
        Self::new(THERMAL_ZONE0)
    }
}

impl HostProbe for ThermalZoneProbe {
    fn device_temperature(&mut self) -> Option<f64> {
        match fs::read_to_string(&self.path) {
            Ok(text) => parse_millidegrees(&text),
            Err(e) => {
                debug!("{}: {}", self.path.display(), e);
                None
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProbe;

impl HostProbe for NoProbe {
    fn device_temperature(&mut self) -> Option<f64> {
        None
    }
}
