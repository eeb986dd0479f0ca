//! Fault logging and on-demand diagnostics.
//!
//! Keeps the last 10 fault records in a RAM ring (oldest overwritten).
//! Each record captures the error code, timestamp, the state the fault
//! was raised from and the cycle count at that moment.  The ring can be
//! persisted to a [`StoragePort`] as a postcard blob under the "faults"
//! namespace so history survives a reset.
//!
//! The [`DiagnosticTrigger`] watches for the door being held open for a
//! long time and produces a [`DiagnosticSummary`] that the indicator
//! engine renders as blink counts.

use heapless::HistoryBuffer;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{FaultLogPort, StorageError, StoragePort};
use crate::error::ErrorCode;
use crate::fsm::StateId;
use crate::fsm::context::{SensorSnapshot, SystemStats};

pub const FAULT_LOG_SLOTS: usize = 10;
const FAULT_NAMESPACE: &str = "faults";
const FAULT_KEY: &str = "ring";

/// How long the door must stay open before diagnostics run.
pub const DIAGNOSTIC_HOLD_MS: u64 = 10_000;

/// One occurrence of the controller entering `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultRecord {
    pub error_code: ErrorCode,
    pub timestamp_ms: u64,
    pub state_at_fault: StateId,
    pub cycle_count: u32,
}

// ───────────────────────────────────────────────────────────────
// Fault log
// ───────────────────────────────────────────────────────────────

/// Bounded in-memory fault ring.
pub struct FaultLog {
    ring: HistoryBuffer<FaultRecord, FAULT_LOG_SLOTS>,
    /// Total records ever written, including overwritten ones.
    written: u32,
}

impl Default for FaultLog {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultLog {
    pub fn new() -> Self {
        Self {
            ring: HistoryBuffer::new(),
            written: 0,
        }
    }

    /// Records currently held, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &FaultRecord> {
        self.ring.oldest_ordered()
    }

    /// Most recent record, if any.
    pub fn latest(&self) -> Option<&FaultRecord> {
        self.ring.recent()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.len() == 0
    }

    pub fn total_written(&self) -> u32 {
        self.written
    }

    pub fn clear(&mut self) {
        self.ring.clear();
        self.written = 0;
    }

    /// Persist the ring (oldest first) to storage.
    pub fn save(&self, storage: &mut dyn StoragePort) -> Result<(), StorageError> {
        let records: heapless::Vec<FaultRecord, FAULT_LOG_SLOTS> =
            self.records().copied().collect();
        let bytes = postcard::to_allocvec(&records).map_err(|_| StorageError::IoError)?;
        storage.write(FAULT_NAMESPACE, FAULT_KEY, &bytes)
    }

    /// Rebuild a log from storage.  A missing blob yields an empty log.
    pub fn restore(storage: &dyn StoragePort) -> Result<Self, StorageError> {
        let mut log = Self::new();
        let mut buf = [0u8; 512];
        let len = match storage.read(FAULT_NAMESPACE, FAULT_KEY, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => return Ok(log),
            Err(e) => return Err(e),
        };
        let records: heapless::Vec<FaultRecord, FAULT_LOG_SLOTS> =
            postcard::from_bytes(&buf[..len]).map_err(|_| StorageError::Corrupted)?;
        for record in records {
            log.append(record);
        }
        info!("Fault log restored: {} records", log.len());
        Ok(log)
    }
}

impl FaultLogPort for FaultLog {
    fn append(&mut self, record: FaultRecord) {
        self.ring.write(record);
        self.written = self.written.saturating_add(1);
    }
}

// ───────────────────────────────────────────────────────────────
// Door-hold diagnostics
// ───────────────────────────────────────────────────────────────

/// Snapshot shown to the user when diagnostics are triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticSummary {
    pub door_closed: bool,
    pub tank_full: bool,
    /// Error count, capped at 10 blinks.
    pub error_blinks: u8,
    /// Tens digit of the cycle count.
    pub cycle_tens: u8,
}

impl DiagnosticSummary {
    pub fn capture(sensors: &SensorSnapshot, stats: &SystemStats) -> Self {
        Self {
            door_closed: sensors.door_closed,
            tank_full: sensors.tank_full,
            error_blinks: stats.error_count.min(10) as u8,
            cycle_tens: ((stats.cycle_count / 10) % 10) as u8,
        }
    }
}

/// Fires once each time the door stays open longer than the hold time.
#[derive(Debug, Default)]
pub struct DiagnosticTrigger {
    door_open_since: Option<u64>,
}

impl DiagnosticTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(
        &mut self,
        now_ms: u64,
        sensors: &SensorSnapshot,
        stats: &SystemStats,
    ) -> Option<DiagnosticSummary> {
        if sensors.door_closed {
            self.door_open_since = None;
            return None;
        }

        match self.door_open_since {
            None => {
                self.door_open_since = Some(now_ms);
                None
            }
            Some(since) if now_ms.saturating_sub(since) > DIAGNOSTIC_HOLD_MS => {
                // Re-arm so holding longer fires again after another hold.
                self.door_open_since = Some(now_ms);
                let summary = DiagnosticSummary::capture(sensors, stats);
                info!(
                    "Diagnostics: errors={} cycle_tens={}",
                    summary.error_blinks, summary.cycle_tens
                );
                Some(summary)
            }
            Some(_) => None,
        }
    }
}

/// Log every stored fault at warn level (serial dump on request).
pub fn dump_faults(log: &FaultLog) {
    for (i, r) in log.records().enumerate() {
        warn!(
            "fault[{}] code={} ({}) t={}ms state={} cycles={}",
            i,
            r.error_code.as_u8(),
            r.error_code,
            r.timestamp_ms,
            r.state_at_fault,
            r.cycle_count
        );
    }
}
