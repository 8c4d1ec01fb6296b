//! Hardware adapters — bridge `embedded-hal` peripherals to the domain ports.
//!
//! | Adapter           | Implements        | Drives                          |
//! |-------------------|-------------------|---------------------------------|
//! | [`RelayHeater`]   | HeaterActuator    | one or more relay `OutputPin`s  |
//! | [`PwmLight`]      | LightActuator     | LED `SetDutyCycle` channel      |
//! | [`HardwareAdapter`] | all three ports | bundles a source and both above |
//!
//! Platform crates (Linux GPIO, RP2040, ESP32, …) supply the pin and PWM
//! types; this module only depends on the `embedded-hal` traits.  The
//! `open` constructors take the GPIO numbers from [`HeaterConfig`] and
//! [`LightConfig`] and hand each one to a platform pin factory.

use embedded_hal::digital::{Error as _, OutputPin};
use embedded_hal::pwm::{Error as _, SetDutyCycle};
use log::{debug, warn};

use crate::app::ports::{HeaterActuator, LightActuator, RawSensorSource};
use crate::config::{HeaterConfig, LightConfig};
use crate::control::light::MAX_LEVEL;
use crate::error::{ActuatorError, SensorError};

// ── Heater relay ──────────────────────────────────────────────

/// Heater relay bank; every pin is switched together.
pub struct RelayHeater<P> {
    pins: Vec<P>,
    /// Relay boards that close on LOW.
    active_low: bool,
}

impl<P: OutputPin> RelayHeater<P> {
    pub fn new(pins: Vec<P>, active_low: bool) -> Self {
        Self { pins, active_low }
    }

    /// Open every relay pin in `cfg.pins` with the platform's factory.
    pub fn open<E>(
        cfg: &HeaterConfig,
        mut open_pin: impl FnMut(u8) -> Result<P, E>,
    ) -> Result<Self, E> {
        let pins = cfg
            .pins
            .iter()
            .map(|&gpio| open_pin(gpio))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Heater relays on GPIO {:?}, active {}",
            cfg.pins,
            if cfg.active_low { "low" } else { "high" }
        );
        Ok(Self::new(pins, cfg.active_low))
    }

    /// Hand the pins back (e.g. to reset them on shutdown).
    pub fn release(self) -> Vec<P> {
        self.pins
    }
}

impl<P: OutputPin> HeaterActuator for RelayHeater<P> {
    fn set_power(&mut self, on: bool) -> Result<(), ActuatorError> {
        let drive_high = on != self.active_low;
        let mut result = Ok(());
        // Keep going after a failure so the remaining relays still switch.
        for (i, pin) in self.pins.iter_mut().enumerate() {
            let r = if drive_high {
                pin.set_high()
            } else {
                pin.set_low()
            };
            if let Err(e) = r {
                warn!("Heater relay {}: {:?}", i, e.kind());
                result = Err(ActuatorError::GpioWriteFailed);
            }
        }
        result
    }
}

// ── LED PWM ───────────────────────────────────────────────────

/// LED strip on a PWM channel; 0..=1024 maps onto the full duty range.
pub struct PwmLight<P> {
    pwm: P,
}

impl<P: SetDutyCycle> PwmLight<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm }
    }

    pub fn open<E>(
        cfg: &LightConfig,
        open_pwm: impl FnOnce(u8) -> Result<P, E>,
    ) -> Result<Self, E> {
        debug!("LED PWM on GPIO {}", cfg.pin);
        open_pwm(cfg.pin).map(Self::new)
    }

    pub fn release(self) -> P {
        self.pwm
    }
}

impl<P: SetDutyCycle> LightActuator for PwmLight<P> {
    fn set_level(&mut self, level: u16) -> Result<(), ActuatorError> {
        self.pwm
            .set_duty_cycle_fraction(level.min(MAX_LEVEL), MAX_LEVEL)
            .map_err(|e| {
                warn!("LED PWM: {:?}", e.kind());
                ActuatorError::PwmWriteFailed
            })
    }
}

// ── Combined adapter ──────────────────────────────────────────

/// Bundles a sensor source and both actuators behind one value so the
/// control cycle can borrow them together.
pub struct HardwareAdapter<S, H, L> {
    pub sensors: S,
    pub heater: H,
    pub light: L,
}

impl<S, H, L> HardwareAdapter<S, H, L> {
    pub fn new(sensors: S, heater: H, light: L) -> Self {
        Self {
            sensors,
            heater,
            light,
        }
    }
}

impl<S: RawSensorSource, H, L> RawSensorSource for HardwareAdapter<S, H, L> {
    fn read_channel(&mut self, index: usize) -> Result<f64, SensorError> {
        self.sensors.read_channel(index)
    }
}

impl<S, H: HeaterActuator, L> HeaterActuator for HardwareAdapter<S, H, L> {
    fn set_power(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.heater.set_power(on)
    }
}

impl<S, H, L: LightActuator> LightActuator for HardwareAdapter<S, H, L> {
    fn set_level(&mut self, level: u16) -> Result<(), ActuatorError> {
        self.light.set_level(level)
    }
}
