//! Lifetime usage statistics.
//!
//! Estimates delivered volume from pump run time and the configured flow
//! rate.  Run time is tracked at whole-second granularity.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_fills: u32,
    pub total_runtime_secs: u32,
    pub total_millilitres: u32,
}

impl UsageStats {
    pub const fn new() -> Self {
        Self {
            total_fills: 0,
            total_runtime_secs: 0,
            total_millilitres: 0,
        }
    }

    /// Fold in one completed pump run.
    pub fn record_fill(&mut self, run_ms: u64, flow_ml_per_sec: u16) {
        let secs = u32::try_from(run_ms / 1_000).unwrap_or(u32::MAX);
        self.total_fills = self.total_fills.saturating_add(1);
        self.total_runtime_secs = self.total_runtime_secs.saturating_add(secs);
        self.total_millilitres = self
            .total_millilitres
            .saturating_add(secs.saturating_mul(u32::from(flow_ml_per_sec)));
    }

    pub fn total_litres(&self) -> u32 {
        self.total_millilitres / 1_000
    }
}
