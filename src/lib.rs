//! Vivarium controller library.
//!
//! Exposes the pure-logic modules (calibration, aggregation, heater and
//! light control, the control cycle) for integration testing, and the
//! adapters and the run loop the `vivarium` binary wires together.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod housekeeping;
pub mod runner;
pub mod sensors;
pub mod telemetry;
