//! Host time adapters.
//!
//! - [`LocalClock`] — local wall clock for the heater day cycle and the
//!   light curve.
//! - [`ThreadDelay`] — blocking [`DelayNs`] used for the per-sample settle
//!   delay.

use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use embedded_hal::delay::DelayNs;

use crate::app::ports::Clock;

/// Wall clock in the host's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// `thread::sleep`-backed delay.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl DelayNs for ThreadDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
