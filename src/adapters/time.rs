//! Monotonic clock adapters.
//!
//! - [`SystemClock`] wraps `std::time::Instant` for real-time runs.
//! - [`SimClock`] is advanced explicitly, for accelerated simulation and
//!   tests.

use core::cell::Cell;

use crate::app::ports::TimePort;

pub struct SystemClock {
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl TimePort for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

#[derive(Debug, Default)]
pub struct SimClock {
    now: Cell<u64>,
}

impl SimClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }
}

impl TimePort for SimClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}
