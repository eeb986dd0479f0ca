//! Non-blocking time-based debouncer.
//!
//! The filtered value only follows the raw value after the raw value has
//! been stable for the configured hold time.  Nothing sleeps: each call
//! compares against the timestamp of the last raw change.

#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    stable: bool,
    candidate: bool,
    candidate_since: u64,
    hold_ms: u64,
}

impl Debouncer {
    /// Start with a known level, e.g. the first raw sample at boot.
    pub fn new(initial: bool, hold_ms: u32) -> Self {
        Self {
            stable: initial,
            candidate: initial,
            candidate_since: 0,
            hold_ms: u64::from(hold_ms),
        }
    }

    /// Feed one raw sample and return the filtered level.
    pub fn update(&mut self, raw: bool, now_ms: u64) -> bool {
        if raw != self.candidate {
            self.candidate = raw;
            self.candidate_since = now_ms;
        }
        if self.candidate != self.stable
            && now_ms.saturating_sub(self.candidate_since) >= self.hold_ms
        {
            self.stable = self.candidate;
        }
        self.stable
    }

    pub fn value(&self) -> bool {
        self.stable
    }
}
