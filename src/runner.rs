//! Control loop.
//!
//! [`Runner`] drives a [`ControlCycle`] at the configured tick interval,
//! pushes each record through the [`TelemetryBuffer`], runs housekeeping,
//! and stops when the tick limit is reached or a [`StopFlag`] is raised.
//! Whatever ends the loop, the actuators are released through
//! [`ControlCycle::shutdown`] and pending telemetry gets one last flush.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::app::ports::{
    Clock, EventSink, HeaterActuator, HostProbe, LightActuator, LogSink, RawSensorSource,
};
use crate::app::service::ControlCycle;
use crate::config::SystemConfig;
use crate::error::{ConfigError, SinkError};
use crate::housekeeping::Housekeeper;
use crate::telemetry::TelemetryBuffer;

/// Granularity of [`StopFlag::wait`].
const STOP_POLL: Duration = Duration::from_millis(100);

// ── Stop flag ─────────────────────────────────────────────────

/// Shared "please stop" request.  Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sleep for up to `duration`, waking early once a stop is requested.
    /// Returns `true` if a stop was requested.
    pub fn wait(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_requested() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep((deadline - now).min(STOP_POLL));
        }
    }
}

// ── Runner ────────────────────────────────────────────────────

pub struct Runner {
    cycle: ControlCycle,
    buffer: TelemetryBuffer,
    housekeeper: Option<Housekeeper>,
    interval: Duration,
    tick_limit: Option<u64>,
    stop: StopFlag,
}

impl Runner {
    pub fn new(
        config: &SystemConfig,
        cycle: ControlCycle,
        stop: StopFlag,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            cycle,
            buffer: TelemetryBuffer::new(config.data.backlog),
            housekeeper: config
                .housekeeping
                .enabled
                .then(|| Housekeeper::new(&config.housekeeping)),
            interval: config.tick_interval()?,
            tick_limit: None,
            stop,
        })
    }

    /// Stop on its own after `limit` ticks.  `None` runs until stopped.
    #[must_use]
    pub fn with_tick_limit(mut self, limit: Option<u64>) -> Self {
        self.tick_limit = limit;
        self
    }

    /// Run until the tick limit or a stop request, then release the
    /// actuators and flush what is still pending.
    ///
    /// Returns the number of ticks run.  Only the final flush can fail;
    /// sink errors during the loop leave records in the backlog.
    pub fn run(
        &mut self,
        hw: &mut (impl RawSensorSource + HeaterActuator + LightActuator),
        delay: &mut impl DelayNs,
        probe: &mut impl HostProbe,
        events: &mut impl EventSink,
        clock: &impl Clock,
        sink: &mut impl LogSink,
    ) -> Result<u64, SinkError> {
        self.cycle.start(events);
        let mut ticks: u64 = 0;

        while !self.stop.is_requested() {
            let started = Instant::now();
            let now = clock.now();

            let record = self.cycle.run_once(now, hw, delay, probe, events);
            self.buffer.push(record);
            match self.buffer.flush(sink) {
                Ok(n) => debug!("Flushed {} records", n),
                Err(_) => debug!("{} records pending", self.buffer.len()),
            }

            if let Some(hk) = self.housekeeper.as_mut() {
                hk.tick(now);
            }

            ticks += 1;
            if self.tick_limit.is_some_and(|limit| ticks >= limit) {
                break;
            }
            self.stop.wait(self.interval.saturating_sub(started.elapsed()));
        }

        if self.stop.is_requested() {
            info!("Stop requested after {} ticks", ticks);
        }
        self.cycle.shutdown(hw, events);
        if !self.buffer.is_empty() {
            self.buffer.flush(sink)?;
        }
        Ok(ticks)
    }

    pub fn cycle(&self) -> &ControlCycle {
        &self.cycle
    }

    /// Records still waiting for the sink.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
