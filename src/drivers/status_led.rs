//! Program and status indicator LEDs.

use embedded_hal::digital::OutputPin;
use log::error;

use super::led_patterns::LedOutputs;
use super::output::{OutputPolarity, PolarizedOutput};
use crate::error::ActuatorError;

pub struct IndicatorLeds<A, B> {
    program: PolarizedOutput<A>,
    status: PolarizedOutput<B>,
}

impl<A: OutputPin, B: OutputPin> IndicatorLeds<A, B> {
    pub fn new(
        program: A,
        program_polarity: OutputPolarity,
        status: B,
        status_polarity: OutputPolarity,
    ) -> Result<Self, ActuatorError> {
        Ok(Self {
            program: PolarizedOutput::new(program, program_polarity)?,
            status: PolarizedOutput::new(status, status_polarity)?,
        })
    }

    /// Only pins whose state changes are written.
    pub fn show(&mut self, leds: LedOutputs) {
        if self.program.is_on() != leds.program {
            if let Err(e) = self.program.set(leds.program) {
                error!("Program LED: {}", e);
            }
        }
        if self.status.is_on() != leds.status {
            if let Err(e) = self.status.set(leds.status) {
                error!("Status LED: {}", e);
            }
        }
    }

    pub fn current(&self) -> LedOutputs {
        LedOutputs {
            program: self.program.is_on(),
            status: self.status.is_on(),
        }
    }

    pub fn off(&mut self) {
        self.show(LedOutputs::OFF);
    }
}
