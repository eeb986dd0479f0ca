//! Battery voltage monitor.
//!
//! The supply is sampled by a 12-bit ADC behind a 2:1 resistor divider
//! referenced to 3.3 V.

use log::warn;

const ADC_FULL_SCALE: u32 = 4095;
const ADC_REF_MV: u32 = 3300;
const DIVIDER_RATIO: u32 = 2;

/// Below this the supply is reported low.
pub const LOW_BATTERY_MV: u16 = 3000;

/// Convert a raw ADC sample to supply millivolts.
pub fn raw_to_millivolts(raw: u16) -> u16 {
    let raw = u32::from(raw).min(ADC_FULL_SCALE);
    (raw * ADC_REF_MV * DIVIDER_RATIO / ADC_FULL_SCALE) as u16
}

/// Tracks the latest battery reading and warns once per low episode.
#[derive(Debug, Default)]
pub struct BatteryMonitor {
    millivolts: Option<u16>,
    low_reported: bool,
}

impl BatteryMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in a raw ADC sample and return the supply voltage.
    pub fn sample(&mut self, raw: u16) -> u16 {
        let mv = raw_to_millivolts(raw);
        self.millivolts = Some(mv);
        if mv < LOW_BATTERY_MV {
            if !self.low_reported {
                warn!("Battery low: {} mV", mv);
                self.low_reported = true;
            }
        } else {
            self.low_reported = false;
        }
        mv
    }

    pub fn millivolts(&self) -> Option<u16> {
        self.millivolts
    }

    pub fn is_low(&self) -> bool {
        self.millivolts.is_some_and(|mv| mv < LOW_BATTERY_MV)
    }
}
