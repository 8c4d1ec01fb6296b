//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (stderr via `env_logger` in the binary).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as one line.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { channels } => {
                info!("START | channels={}", channels);
            }
            AppEvent::HeaterSwitched { on, median, target } => {
                info!(
                    "HEATER | {} | median={:.2}\u{00b0}C target={:.2}\u{00b0}C",
                    if *on { "ON" } else { "OFF" },
                    median,
                    target
                );
            }
            AppEvent::LightChanged { level } => {
                info!("LIGHT | level={}/1024", level);
            }
            AppEvent::NoValidReading { target } => {
                warn!("SENSORS | no valid reading, target={:.2}\u{00b0}C", target);
            }
            AppEvent::ActuatorFault { actuator, error } => {
                warn!("FAULT | {:?}: {}", actuator, error);
            }
            AppEvent::Shutdown => {
                info!("STOP | actuators released");
            }
        }
    }
}
