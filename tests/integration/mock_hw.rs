//! Mock hardware adapter for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history, and serves a scriptable sensor snapshot in place of real
//! switch inputs.

use refill::app::events::AppEvent;
use refill::app::ports::{ActuatorPort, EventSink, SensorPort, StorageError, StoragePort};
use refill::drivers::led_patterns::LedOutputs;
use refill::error::SensorError;
use refill::fsm::context::SensorSnapshot;
use std::collections::HashMap;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    SetPump(bool),
    SetIndicators(LedOutputs),
    AllOff,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    pub sensors: SensorSnapshot,
    pub self_test_error: Option<SensorError>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(sensors: SensorSnapshot) -> Self {
        Self {
            calls: Vec::new(),
            sensors,
            self_test_error: None,
        }
    }

    pub fn door_open() -> Self {
        Self::new(snapshot(false, false))
    }

    pub fn closed_empty() -> Self {
        Self::new(snapshot(true, false))
    }

    pub fn closed_full() -> Self {
        Self::new(snapshot(true, true))
    }

    pub fn set_door(&mut self, closed: bool) {
        self.sensors.door_closed = closed;
    }

    pub fn set_full(&mut self, full: bool) {
        self.sensors.tank_full = full;
        self.sensors.tank_empty = !full;
    }

    pub fn set_overflow(&mut self, tripped: bool) {
        self.sensors.overflow = tripped;
    }

    /// Level of the most recent pump write.
    pub fn pump_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::SetPump(on) => Some(*on),
                ActuatorCall::AllOff => Some(false),
                ActuatorCall::SetIndicators(_) => None,
            })
            .unwrap_or(false)
    }

    pub fn leds(&self) -> LedOutputs {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::SetIndicators(leds) => Some(*leds),
                ActuatorCall::AllOff => Some(LedOutputs::OFF),
                ActuatorCall::SetPump(_) => None,
            })
            .unwrap_or(LedOutputs::OFF)
    }

    pub fn pump_writes(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, ActuatorCall::SetPump(_)))
            .count()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

pub fn snapshot(door_closed: bool, tank_full: bool) -> SensorSnapshot {
    SensorSnapshot {
        door_closed,
        tank_full,
        tank_empty: !tank_full,
        overflow: false,
    }
}

impl SensorPort for MockHardware {
    fn read_all(&mut self, _now_ms: u64) -> SensorSnapshot {
        self.sensors
    }

    fn self_test(&mut self, _now_ms: u64) -> Result<(), SensorError> {
        self.self_test_error.map_or(Ok(()), Err)
    }
}

impl ActuatorPort for MockHardware {
    fn set_pump(&mut self, on: bool) {
        self.calls.push(ActuatorCall::SetPump(on));
    }

    fn set_indicators(&mut self, leds: LedOutputs) {
        self.calls.push(ActuatorCall::SetIndicators(leds));
    }

    fn all_off(&mut self) {
        self.calls.push(ActuatorCall::AllOff);
    }
}

// ── MockStorage ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockStorage {
    store: HashMap<String, Vec<u8>>,
}

#[allow(dead_code)]
impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn corrupt(&mut self, namespace: &str, key: &str) {
        if let Some(v) = self.store.get_mut(&format!("{}::{}", namespace, key)) {
            v.iter_mut().for_each(|b| *b = 0xFF);
        }
    }
}

impl StoragePort for MockStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.get(&format!("{}::{}", namespace, key)) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store
            .insert(format!("{}::{}", namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&format!("{}::{}", namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&format!("{}::{}", namespace, key))
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn transitions(&self) -> Vec<(&'static str, &'static str)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { from, to } => Some((from.name(), to.name())),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
