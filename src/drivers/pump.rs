//! Refill pump driver (relay or MOSFET on a single GPIO).
//!
//! ## Safety contract
//!
//! The pump must only run while the controller is `Filling`.  That is
//! enforced by the application service; this driver is a dumb actuator
//! that only tracks what it was last told.

use embedded_hal::digital::OutputPin;
use log::{debug, error};

use super::output::{OutputPolarity, PolarizedOutput};
use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Stopped,
    Running,
}

pub struct PumpDriver<P> {
    out: PolarizedOutput<P>,
    /// Number of off → on switches since boot.
    starts: u32,
}

impl<P: OutputPin> PumpDriver<P> {
    /// Take the pin and force the pump off.
    pub fn new(pin: P, polarity: OutputPolarity) -> Result<Self, ActuatorError> {
        Ok(Self {
            out: PolarizedOutput::new(pin, polarity)?,
            starts: 0,
        })
    }

    /// Command the pump.  Repeating the current state still rewrites the pin.
    pub fn set(&mut self, on: bool) {
        let was_on = self.out.is_on();
        match self.out.set(on) {
            Ok(()) => {
                if on && !was_on {
                    self.starts = self.starts.saturating_add(1);
                    debug!("Pump ON");
                } else if !on && was_on {
                    debug!("Pump OFF");
                }
            }
            Err(e) => error!("Pump output: {}", e),
        }
    }

    pub fn stop(&mut self) {
        self.set(false);
    }

    pub fn state(&self) -> PumpState {
        if self.out.is_on() {
            PumpState::Running
        } else {
            PumpState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.out.is_on()
    }

    pub fn starts(&self) -> u32 {
        self.starts
    }
}
