//! Polarity-aware digital output.
//!
//! Wraps an `embedded-hal` [`OutputPin`] so callers deal in logical
//! on/off while the wiring decides which level that means.

use embedded_hal::digital::{OutputPin, PinState};
use serde::{Deserialize, Serialize};

use crate::error::ActuatorError;

/// Pin level that switches the load on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputPolarity {
    ActiveHigh,
    ActiveLow,
}

impl OutputPolarity {
    pub fn level_for(self, on: bool) -> PinState {
        match (self, on) {
            (Self::ActiveHigh, true) | (Self::ActiveLow, false) => PinState::High,
            _ => PinState::Low,
        }
    }
}

pub struct PolarizedOutput<P> {
    pin: P,
    polarity: OutputPolarity,
    on: bool,
}

impl<P: OutputPin> PolarizedOutput<P> {
    /// Wrap a pin and drive it to the off level immediately.
    pub fn new(pin: P, polarity: OutputPolarity) -> Result<Self, ActuatorError> {
        let mut out = Self {
            pin,
            polarity,
            on: true,
        };
        out.set(false)?;
        Ok(out)
    }

    /// Drive the load.  On failure the logical state is left unchanged.
    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.pin
            .set_state(self.polarity.level_for(on))
            .map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.on = on;
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn release(self) -> P {
        self.pin
    }
}
