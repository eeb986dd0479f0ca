//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It contains the clock, the latest sensor snapshot, the pump
//! command, transition timestamps, configuration and accumulated
//! statistics.  Think of it as the "blackboard" in a blackboard architecture.

use serde::{Deserialize, Serialize};

use super::StateId;
use crate::config::SystemConfig;
use crate::diagnostics::FaultRecord;
use crate::duty_cycle::DutyCycleLimiter;
use crate::error::ErrorCode;

// ---------------------------------------------------------------------------
// Sensor snapshot (read-only to state handlers; written by sensor hub)
// ---------------------------------------------------------------------------

/// A point-in-time snapshot of every sensor in the system.
///
/// Values are already debounced and normalised for wiring polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub door_closed: bool,
    pub tank_full: bool,
    pub tank_empty: bool,
    /// Always `false` when the overflow sensor is disabled.
    pub overflow: bool,
}

impl Default for SensorSnapshot {
    /// Door open, nothing asserted: the safest assumption before a read.
    fn default() -> Self {
        Self {
            door_closed: false,
            tank_full: false,
            tank_empty: false,
            overflow: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Actuator commands (written by state handlers; consumed by main loop)
// ---------------------------------------------------------------------------

/// Commands that state handlers write to request actuator actions.
/// The service applies these to the pump each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorCommands {
    /// Desired pump state.  Only the `Filling` handlers ever set it.
    pub pump_on: bool,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Running counters describing pump usage and faults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStats {
    /// Accumulated pump on-time across completed runs.
    pub total_run_time_ms: u64,
    /// Number of `Filling` entries.
    pub cycle_count: u32,
    pub last_fill_duration_ms: u32,
    pub average_fill_duration_ms: u32,
    pub longest_fill_ms: u32,
    /// `None` until the first run completes.
    pub shortest_fill_ms: Option<u32>,
    /// Entries into `Error` plus duty-cycle breaches.
    pub error_count: u32,
    pub last_error_code: ErrorCode,
    // Running average inputs; survive an error reset.
    pub(crate) fill_samples: u32,
    pub(crate) fill_sum_ms: u64,
}

impl SystemStats {
    /// Fold one completed pump run into the counters.
    pub fn record_fill(&mut self, duration_ms: u64) {
        let duration = u32::try_from(duration_ms).unwrap_or(u32::MAX);
        self.total_run_time_ms = self.total_run_time_ms.saturating_add(duration_ms);
        self.last_fill_duration_ms = duration;
        self.longest_fill_ms = self.longest_fill_ms.max(duration);
        self.shortest_fill_ms = Some(self.shortest_fill_ms.map_or(duration, |s| s.min(duration)));
        self.fill_samples = self.fill_samples.saturating_add(1);
        self.fill_sum_ms = self.fill_sum_ms.saturating_add(duration_ms);
        self.average_fill_duration_ms =
            u32::try_from(self.fill_sum_ms / u64::from(self.fill_samples)).unwrap_or(u32::MAX);
    }

    /// Zero the cycle and run-time counters.  Error history is kept.
    pub fn reset_cycles(&mut self) {
        self.cycle_count = 0;
        self.total_run_time_ms = 0;
    }

    /// Average on-time per cycle, if any cycle has started.
    pub fn average_cycle_time_ms(&self) -> Option<u64> {
        (self.cycle_count > 0).then(|| self.total_run_time_ms / u64::from(self.cycle_count))
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Monotonic milliseconds for the current tick.  Set before each tick.
    pub now_ms: u64,
    /// When the current state was entered.  Also restarted while in
    /// `Error` whenever the door reads closed.
    pub state_entered_at: u64,
    /// State before the most recent transition.
    pub previous: StateId,

    // -- Sensor data --
    /// Latest sensor readings.  Updated before each FSM tick.
    pub sensors: SensorSnapshot,

    // -- Actuator outputs --
    /// Commands to be applied to actuators after the FSM tick.
    pub commands: ActuatorCommands,

    // -- Pump bookkeeping --
    /// Start of the current run; meaningful only while `Filling`.
    pub pump_started_at: u64,
    /// End of the most recent run.
    pub pump_stopped_at: Option<u64>,
    pub duty: DutyCycleLimiter,

    // -- Faults --
    pub error_code: ErrorCode,
    /// Written by `Error` entry; drained to the fault log by the service.
    pub pending_fault: Option<FaultRecord>,

    pub stats: SystemStats,

    // -- Configuration --
    /// System configuration (load-time only).
    pub config: SystemConfig,
}

impl FsmContext {
    /// Create a new context with the given configuration.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            now_ms: 0,
            state_entered_at: 0,
            previous: StateId::Idle,
            sensors: SensorSnapshot::default(),
            commands: ActuatorCommands::default(),
            pump_started_at: 0,
            pump_stopped_at: None,
            duty: DutyCycleLimiter::new(),
            error_code: ErrorCode::None,
            pending_fault: None,
            stats: SystemStats::default(),
            config,
        }
    }

    /// Milliseconds elapsed since the current state was entered.
    pub fn ms_in_state(&self) -> u64 {
        self.now_ms.saturating_sub(self.state_entered_at)
    }

    /// Milliseconds the pump has been running in the current run.
    pub fn pump_run_time_ms(&self) -> u64 {
        self.now_ms.saturating_sub(self.pump_started_at)
    }

    /// Stop-side bookkeeping for a pump run that ends now.
    pub fn finish_pump_run(&mut self) {
        self.commands.pump_on = false;
        let duration = self.pump_run_time_ms();
        self.stats.record_fill(duration);
        self.pump_stopped_at = Some(self.now_ms);
    }
}
