//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`], the pump driver and the indicator LEDs,
//! exposing them through [`SensorPort`] and [`ActuatorPort`].  This is the
//! only module that touches pins; any `embedded-hal` implementation works,
//! including the simulated lines in [`sim_pins`](super::sim_pins).

use embedded_hal::digital::{InputPin, OutputPin};
use log::info;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::config::SystemConfig;
use crate::drivers::led_patterns::LedOutputs;
use crate::drivers::pump::PumpDriver;
use crate::drivers::status_led::IndicatorLeds;
use crate::error::{Result, SensorError};
use crate::fsm::context::SensorSnapshot;
use crate::sensors::SensorHub;

/// Pin bundle handed to [`HardwareAdapter::new`].
pub struct Pins<D, W, O, P, A, B> {
    pub door: D,
    pub water: W,
    pub overflow: Option<O>,
    pub pump: P,
    pub program_led: A,
    pub status_led: B,
}

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<D, W, O, P, A, B> {
    sensor_hub: SensorHub<D, W, O>,
    pump: PumpDriver<P>,
    leds: IndicatorLeds<A, B>,
}

impl<D, W, O, P, A, B> HardwareAdapter<D, W, O, P, A, B>
where
    D: InputPin,
    W: InputPin,
    O: InputPin,
    P: OutputPin,
    A: OutputPin,
    B: OutputPin,
{
    /// Take ownership of the pins and drive every output off.
    pub fn new(pins: Pins<D, W, O, P, A, B>, config: &SystemConfig) -> Result<Self> {
        let pump = PumpDriver::new(pins.pump, config.pump_output)?;
        let leds = IndicatorLeds::new(
            pins.program_led,
            config.program_led_output,
            pins.status_led,
            config.status_led_output,
        )?;
        let sensor_hub = SensorHub::new(pins.door, pins.water, pins.overflow, config);
        info!(
            "Hardware ready: overflow sensor {}",
            if sensor_hub.has_overflow_sensor() { "active" } else { "absent" }
        );
        Ok(Self {
            sensor_hub,
            pump,
            leds,
        })
    }

    pub fn pump(&self) -> &PumpDriver<P> {
        &self.pump
    }

    pub fn leds(&self) -> LedOutputs {
        self.leds.current()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<D, W, O, P, A, B> SensorPort for HardwareAdapter<D, W, O, P, A, B>
where
    D: InputPin,
    W: InputPin,
    O: InputPin,
{
    fn read_all(&mut self, now_ms: u64) -> SensorSnapshot {
        self.sensor_hub.read_all(now_ms)
    }

    fn self_test(&mut self, _now_ms: u64) -> core::result::Result<(), SensorError> {
        self.sensor_hub.self_test()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<D, W, O, P, A, B> ActuatorPort for HardwareAdapter<D, W, O, P, A, B>
where
    P: OutputPin,
    A: OutputPin,
    B: OutputPin,
{
    fn set_pump(&mut self, on: bool) {
        self.pump.set(on);
    }

    fn set_indicators(&mut self, leds: LedOutputs) {
        self.leds.show(leds);
    }

    fn all_off(&mut self) {
        self.pump.stop();
        self.leds.off();
    }
}
