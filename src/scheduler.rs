//! Control-loop cadence.
//!
//! The outer loop spins freely; [`LoopScheduler`] decides when a control
//! tick is due and when the watchdog must be fed.  Both are polled against
//! the monotonic clock, never counted in loop iterations.
//!
//! ```text
//!   loop {
//!       now = clock.now_ms()
//!       due = scheduler.poll(now)
//!       if due.feed_watchdog { watchdog.feed(now) }
//!       if due.control_tick  { service.tick(..); scheduler.adapt(state) }
//!   }
//! ```
//!
//! The tick interval adapts to the state after each tick: fast while the
//! pump runs, medium where a human is interacting, slow otherwise.

use log::{debug, warn};

use crate::app::ports::WatchdogPort;
use crate::fsm::StateId;

pub const FILLING_INTERVAL_MS: u64 = 10;
pub const ATTENTION_INTERVAL_MS: u64 = 20;
pub const RELAXED_INTERVAL_MS: u64 = 50;
pub const WATCHDOG_FEED_INTERVAL_MS: u64 = 3_000;

/// Tick interval for a state.
pub fn interval_for(state: StateId) -> u64 {
    match state {
        StateId::Filling => FILLING_INTERVAL_MS,
        StateId::DoorOpen | StateId::Error => ATTENTION_INTERVAL_MS,
        _ => RELAXED_INTERVAL_MS,
    }
}

/// What the loop should do at this instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Due {
    pub control_tick: bool,
    pub feed_watchdog: bool,
    /// Time since the previous control tick (0 unless `control_tick`).
    pub delta_ms: u64,
}

pub struct LoopScheduler {
    interval_ms: u64,
    last_tick: u64,
    last_feed: u64,
    ticks: u64,
}

impl Default for LoopScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopScheduler {
    pub fn new() -> Self {
        Self {
            interval_ms: FILLING_INTERVAL_MS,
            last_tick: 0,
            last_feed: 0,
            ticks: 0,
        }
    }

    /// Check both timers and consume whichever is due.
    pub fn poll(&mut self, now_ms: u64) -> Due {
        let mut due = Due::default();

        if now_ms.saturating_sub(self.last_feed) >= WATCHDOG_FEED_INTERVAL_MS {
            self.last_feed = now_ms;
            due.feed_watchdog = true;
        }

        let since_tick = now_ms.saturating_sub(self.last_tick);
        if since_tick >= self.interval_ms {
            self.last_tick = now_ms;
            self.ticks += 1;
            due.control_tick = true;
            due.delta_ms = since_tick;
        }

        due
    }

    /// Pick the next interval from the state the tick left behind.
    pub fn adapt(&mut self, state: StateId) {
        let next = interval_for(state);
        if next != self.interval_ms {
            debug!("Loop interval {} -> {} ms ({})", self.interval_ms, next, state);
            self.interval_ms = next;
        }
    }

    /// Feed the watchdog, logging a late feed instead of failing the loop.
    pub fn feed(&self, now_ms: u64, watchdog: &mut impl WatchdogPort) {
        if let Err(e) = watchdog.feed(now_ms) {
            warn!("Watchdog feed: {}", e);
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Time until the next control tick, for sleeping between polls.
    pub fn until_next_tick(&self, now_ms: u64) -> u64 {
        (self.last_tick + self.interval_ms).saturating_sub(now_ms)
    }
}
