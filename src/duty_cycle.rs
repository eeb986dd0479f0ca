//! Pump duty-cycle limiter.
//!
//! Tracks pump on-time inside a non-carrying window.  The window is opened
//! lazily on the first pump start and restarted (accumulator cleared) once
//! its age exceeds the configured span.  While the pump runs, each
//! evaluation adds the time since the previous sample and compares the
//! on-time ratio against the limit.
//!
//! Invariant: `on_time_ms <= now - window_start`.

use serde::{Deserialize, Serialize};

/// Windows younger than this never reject; the ratio is too noisy.
const MIN_WINDOW_AGE_MS: u64 = 1_000;

/// Result of a duty-cycle evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DutyVerdict {
    /// Window too young to judge.
    Warming,
    Allowed { percent: u8 },
    Exceeded { percent: u8 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyCycleLimiter {
    window_start: Option<u64>,
    on_time_ms: u64,
    last_sample_at: u64,
}

impl DutyCycleLimiter {
    pub const fn new() -> Self {
        Self {
            window_start: None,
            on_time_ms: 0,
            last_sample_at: 0,
        }
    }

    /// Mark the start of a pump run so off-time is never counted.
    pub fn pump_started(&mut self, now_ms: u64) {
        if self.window_start.is_none() {
            self.window_start = Some(now_ms);
            self.on_time_ms = 0;
        }
        self.last_sample_at = now_ms;
    }

    /// Account the pump time since the previous sample and judge the ratio.
    /// Call once per tick while the pump runs.
    pub fn evaluate(&mut self, now_ms: u64, span_ms: u64, max_percent: u8) -> DutyVerdict {
        let start = match self.window_start {
            Some(start) if now_ms.saturating_sub(start) <= span_ms => start,
            _ => {
                self.window_start = Some(now_ms);
                self.on_time_ms = 0;
                now_ms
            }
        };

        let elapsed = now_ms.saturating_sub(self.last_sample_at);
        self.last_sample_at = now_ms;

        let age = now_ms - start;
        self.on_time_ms = self.on_time_ms.saturating_add(elapsed).min(age);

        if age < MIN_WINDOW_AGE_MS {
            return DutyVerdict::Warming;
        }

        let percent = (self.on_time_ms * 100 / age).min(100) as u8;
        if percent > max_percent {
            DutyVerdict::Exceeded { percent }
        } else {
            DutyVerdict::Allowed { percent }
        }
    }

    pub fn on_time_ms(&self) -> u64 {
        self.on_time_ms
    }

    /// Age of the current window, or `None` before the first pump start.
    pub fn window_age_ms(&self, now_ms: u64) -> Option<u64> {
        self.window_start.map(|s| now_ms.saturating_sub(s))
    }
}
