//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the control cycle for the vivarium: sensor
//! aggregation, heater hysteresis and the daylight curve, tied together
//! once per tick.  All interaction with hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
