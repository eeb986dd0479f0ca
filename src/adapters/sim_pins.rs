//! Simulated GPIO lines for host runs.
//!
//! A [`SimLine`] is a shared logic level.  Hand an input or output end to
//! the hardware adapter and keep a clone to drive or observe it from the
//! simulation.

use core::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

#[derive(Debug, Clone, Default)]
pub struct SimLine {
    high: Arc<AtomicBool>,
}

impl SimLine {
    pub fn new(high: bool) -> Self {
        Self {
            high: Arc::new(AtomicBool::new(high)),
        }
    }

    pub fn set_high(&self, high: bool) {
        self.high.store(high, Ordering::Relaxed);
    }

    pub fn is_high(&self) -> bool {
        self.high.load(Ordering::Relaxed)
    }

    pub fn input(&self) -> SimInputPin {
        SimInputPin(self.clone())
    }

    pub fn output(&self) -> SimOutputPin {
        SimOutputPin(self.clone())
    }
}

pub struct SimInputPin(SimLine);

impl ErrorType for SimInputPin {
    type Error = Infallible;
}

impl InputPin for SimInputPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.is_high())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.is_high())
    }
}

pub struct SimOutputPin(SimLine);

impl ErrorType for SimOutputPin {
    type Error = Infallible;
}

impl OutputPin for SimOutputPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set_high(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set_high(true);
        Ok(())
    }
}
