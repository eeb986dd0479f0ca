//! Independent watchdog.
//!
//! On hardware the watchdog resets the MCU if the main loop stalls.  The
//! host build uses [`SimWatchdog`], which records whether every feed
//! arrived within the timeout so simulations and tests can detect a
//! stalled loop.

use log::{info, warn};

use crate::app::ports::WatchdogPort;
use crate::error::WatchdogError;

/// Reset timeout of the hardware watchdog.
pub const WATCHDOG_TIMEOUT_MS: u64 = 5_000;

pub struct SimWatchdog {
    timeout_ms: u64,
    last_feed: Option<u64>,
    feeds: u64,
    expirations: u32,
}

impl Default for SimWatchdog {
    fn default() -> Self {
        Self::new(WATCHDOG_TIMEOUT_MS)
    }
}

impl SimWatchdog {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            last_feed: None,
            feeds: 0,
            expirations: 0,
        }
    }

    /// Start the countdown.
    pub fn arm(&mut self, now_ms: u64) {
        self.last_feed = Some(now_ms);
        info!("Watchdog(sim): armed, {} ms timeout", self.timeout_ms);
    }

    pub fn feeds(&self) -> u64 {
        self.feeds
    }

    /// Times a real watchdog would have reset the device.
    pub fn expirations(&self) -> u32 {
        self.expirations
    }
}

impl WatchdogPort for SimWatchdog {
    fn feed(&mut self, now_ms: u64) -> Result<(), WatchdogError> {
        let last = self.last_feed.ok_or(WatchdogError::NotArmed)?;
        self.last_feed = Some(now_ms);
        self.feeds += 1;

        let since = now_ms.saturating_sub(last);
        if since > self.timeout_ms {
            self.expirations += 1;
            let overdue_ms = since - self.timeout_ms;
            warn!("Watchdog(sim): fed {} ms too late", overdue_ms);
            return Err(WatchdogError::Expired { overdue_ms });
        }
        Ok(())
    }
}
