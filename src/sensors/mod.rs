//! Sensor subsystem: switch inputs and the aggregating [`SensorHub`].
//!
//! The hub owns every input pin and produces a [`SensorSnapshot`] each
//! tick that gets written into `FsmContext.sensors`.  Raw levels pass
//! through the wiring polarity and a debouncer before the FSM sees them.

pub mod battery;
pub mod debounce;
pub mod polarity;

use embedded_hal::digital::InputPin;
use log::warn;

use crate::config::SystemConfig;
use crate::error::SensorError;
use crate::fsm::context::SensorSnapshot;
use debounce::Debouncer;
use polarity::{InputPolarity, NormaliseFn};

/// One debounced, polarity-normalised switch.
pub struct SwitchInput<P> {
    pin: P,
    normalise: NormaliseFn,
    debounce: Debouncer,
    label: &'static str,
    read_failed: bool,
}

impl<P: InputPin> SwitchInput<P> {
    pub fn new(mut pin: P, polarity: InputPolarity, debounce_ms: u32, label: &'static str) -> Self {
        let normalise = polarity.resolve();
        // Seed from the live level; an unreadable pin starts deasserted.
        let initial = pin.is_high().map(normalise).unwrap_or(false);
        Self {
            pin,
            normalise,
            debounce: Debouncer::new(initial, debounce_ms),
            label,
            read_failed: false,
        }
    }

    /// Sample the pin and return the filtered asserted level.
    ///
    /// A failed read keeps the previous filtered value.
    pub fn sample(&mut self, now_ms: u64) -> bool {
        match self.pin.is_high() {
            Ok(high) => {
                self.read_failed = false;
                self.debounce.update((self.normalise)(high), now_ms)
            }
            Err(_) => {
                if !self.read_failed {
                    warn!("{} input read failed, holding last value", self.label);
                }
                self.read_failed = true;
                self.debounce.value()
            }
        }
    }

    /// Unfiltered read used by the self-test.
    fn read_raw(&mut self) -> Result<bool, SensorError> {
        self.pin
            .is_high()
            .map(self.normalise)
            .map_err(|_| SensorError::GpioReadFailed)
    }
}

/// Aggregates the door, water and optional overflow switches.
pub struct SensorHub<D, W, O = D> {
    door: SwitchInput<D>,
    water: SwitchInput<W>,
    /// `None` when the overflow sensor is absent or disabled.
    overflow: Option<SwitchInput<O>>,
}

impl<D, W, O> SensorHub<D, W, O>
where
    D: InputPin,
    W: InputPin,
    O: InputPin,
{
    /// Construct a hub.  The overflow pin is ignored unless the config
    /// enables the overflow sensor.
    pub fn new(door: D, water: W, overflow: Option<O>, config: &SystemConfig) -> Self {
        let debounce = config.debounce_ms;
        let overflow = overflow
            .filter(|_| config.overflow_sensor_enabled)
            .map(|pin| SwitchInput::new(pin, config.overflow_polarity, debounce, "overflow"));
        Self {
            door: SwitchInput::new(door, config.door_polarity, debounce, "door"),
            water: SwitchInput::new(water, config.water_polarity, debounce, "water"),
            overflow,
        }
    }

    /// Read every input and return a unified snapshot.
    pub fn read_all(&mut self, now_ms: u64) -> SensorSnapshot {
        let door_closed = self.door.sample(now_ms);
        // Single limit switch: empty is simply "not full".
        let tank_full = self.water.sample(now_ms);
        let overflow = self
            .overflow
            .as_mut()
            .is_some_and(|input| input.sample(now_ms));

        SensorSnapshot {
            door_closed,
            tank_full,
            tank_empty: !tank_full,
            overflow,
        }
    }

    /// Read every pin directly and check the combination is plausible.
    pub fn self_test(&mut self) -> Result<(), SensorError> {
        self.door.read_raw()?;
        let tank_full = self.water.read_raw()?;
        let overflow = match self.overflow.as_mut() {
            Some(input) => input.read_raw()?,
            None => false,
        };
        check_plausible(&SensorSnapshot {
            door_closed: true,
            tank_full,
            tank_empty: !tank_full,
            overflow,
        })
    }

    pub fn has_overflow_sensor(&self) -> bool {
        self.overflow.is_some()
    }
}

/// Reject snapshots no real installation can produce.
pub fn check_plausible(snapshot: &SensorSnapshot) -> Result<(), SensorError> {
    if snapshot.tank_full && snapshot.tank_empty {
        return Err(SensorError::Contradictory);
    }
    if snapshot.overflow && snapshot.tank_empty {
        return Err(SensorError::Implausible);
    }
    Ok(())
}
