//! Control laws: the heater's day-cycle hysteresis and the daylight curve.

pub mod heater;
pub mod light;
