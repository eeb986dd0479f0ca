//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the FSM, the shared context, the fault log and
//! the indicator engine.  All I/O flows through port traits passed in at
//! each call site.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │        AppService         │
//! ActuatorPort ◀──│  FSM · Guard · Duty · Log │ ──▶ FaultLogPort
//!                 └──────────────────────────┘
//! ```
//!
//! The pump output is written exactly once per tick, after the FSM has
//! settled, and is only ever `true` while the FSM is `Filling`.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{error, info, warn};

use crate::config::SystemConfig;
use crate::diagnostics::{DiagnosticTrigger, FaultLog};
use crate::drivers::led_patterns::{IndicatorEngine, LedOutputs};
use crate::error::{ErrorCode, SensorError};
use crate::fsm::context::{FsmContext, SystemStats};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::usage::UsageStats;

use super::commands::{AppCommand, COMMAND_CHANNEL};
use super::events::{AppEvent, StatusReport};
use super::ports::{ActuatorPort, EventSink, FaultLogPort, SensorPort, StoragePort};

// ───────────────────────────────────────────────────────────────
// Status snapshot
// ───────────────────────────────────────────────────────────────

/// Consistent view of the controller published after every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub state: StateId,
    pub error_code: ErrorCode,
    pub pump_on: bool,
    pub halted: bool,
    pub stats: SystemStats,
}

/// Snapshot cell guarded by a critical section, so a reader in another
/// context never observes a half-written snapshot.
pub struct SharedStatus {
    inner: Mutex<CriticalSectionRawMutex, Cell<StatusSnapshot>>,
}

impl SharedStatus {
    pub fn new(initial: StatusSnapshot) -> Self {
        Self {
            inner: Mutex::new(Cell::new(initial)),
        }
    }

    pub fn publish(&self, snapshot: StatusSnapshot) {
        self.inner.lock(|cell| cell.set(snapshot));
    }

    pub fn read(&self) -> StatusSnapshot {
        self.inner.lock(Cell::get)
    }
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService<F: FaultLogPort = FaultLog> {
    fsm: Fsm,
    ctx: FsmContext,
    faults: F,
    indicators: IndicatorEngine,
    diagnostics: DiagnosticTrigger,
    usage: UsageStats,
    status: SharedStatus,
    last_tick_ms: u64,
    tick_count: u64,
    pump_on: bool,
    halted: bool,
}

impl AppService<FaultLog> {
    /// Construct the service with an in-memory fault log.
    pub fn new(config: SystemConfig) -> Self {
        Self::with_fault_log(config, FaultLog::new())
    }

    /// Construct the service with the fault history persisted in
    /// `storage`.  An unreadable log is replaced by an empty one.
    pub fn with_stored_faults(config: SystemConfig, storage: &dyn StoragePort) -> Self {
        let faults = FaultLog::restore(storage).unwrap_or_else(|e| {
            warn!("Fault log unreadable ({}), starting empty", e);
            FaultLog::new()
        });
        Self::with_fault_log(config, faults)
    }
}

impl<F: FaultLogPort> AppService<F> {
    /// Construct the service from configuration and a fault log.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn with_fault_log(config: SystemConfig, faults: F) -> Self {
        let indicators = IndicatorEngine::new(&config);
        let ctx = FsmContext::new(config);
        let status = SharedStatus::new(StatusSnapshot {
            state: StateId::Idle,
            error_code: ErrorCode::None,
            pump_on: false,
            halted: false,
            stats: ctx.stats,
        });

        Self {
            fsm: Fsm::new(build_state_table(), StateId::Idle),
            ctx,
            faults,
            indicators,
            diagnostics: DiagnosticTrigger::new(),
            usage: UsageStats::new(),
            status,
            last_tick_ms: 0,
            tick_count: 0,
            pump_on: false,
            halted: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Switch the pump off, run the sensor self-test and enter the state
    /// matching the current inputs.
    ///
    /// A failed self-test latches `Error(SensorFault)`; the error is also
    /// returned so the caller can report it.
    pub fn start(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> Result<(), SensorError> {
        hw.set_pump(false);
        self.pump_on = false;

        self.ctx.now_ms = now_ms;
        self.last_tick_ms = now_ms;
        self.ctx.sensors = hw.read_all(now_ms);

        let initial = StateId::initial(&self.ctx.sensors);
        self.fsm = Fsm::new(build_state_table(), initial);
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(initial));
        info!("AppService started in {:?}", initial);

        let self_test = hw.self_test(now_ms);
        if let Err(e) = self_test {
            error!("Sensor self-test failed: {}", e);
            self.handle_command(AppCommand::SensorSelfTestFailed, hw, sink);
        }
        self.indicators.play_boot(self_test.is_ok());

        self.publish_status();
        self_test
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: read sensors → FSM → fault log → pump → LEDs.
    ///
    /// `hw` implements both [`SensorPort`] and [`ActuatorPort`].
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        let delta_ms = now_ms.saturating_sub(self.last_tick_ms);
        self.last_tick_ms = now_ms;

        // 1. Inputs
        let snapshot = hw.read_all(now_ms);
        self.ctx.now_ms = now_ms;
        self.ctx.sensors = snapshot;

        // 2. State logic
        let prev_state = self.fsm.current_state();
        if !self.halted {
            self.fsm.tick(&mut self.ctx);
        }
        self.settle(prev_state, sink);

        // 3. Pump, exactly once
        self.apply_pump(hw);

        // 4. Door-hold diagnostics
        if !self.halted {
            if let Some(summary) = self.diagnostics.update(now_ms, &snapshot, &self.ctx.stats) {
                self.indicators.play_diagnostics(&summary);
                sink.emit(&AppEvent::Diagnostics(summary));
            }
        }

        // 5. Indicators
        let leds = if self.halted {
            LedOutputs::OFF
        } else {
            let delta = u32::try_from(delta_ms).unwrap_or(u32::MAX);
            self.indicators.tick(self.fsm.current_state(), delta)
        };
        hw.set_indicators(leds);

        self.publish_status();
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        if self.halted {
            warn!("Ignoring {:?}: controller halted", cmd);
            return;
        }

        let prev_state = self.fsm.current_state();
        match cmd {
            AppCommand::ClearError => {
                self.ctx.error_code = ErrorCode::None;
                self.fsm.force_transition(StateId::Idle, &mut self.ctx);
                self.ctx.stats.reset_cycles();
                info!("Error cleared by request");
            }
            AppCommand::SensorSelfTestFailed => {
                self.ctx.error_code = ErrorCode::SensorFault;
                self.fsm.force_transition(StateId::Error, &mut self.ctx);
            }
            AppCommand::Shutdown => {
                warn!("Shutdown requested, halting");
                self.halted = true;
                self.ctx.commands.pump_on = false;
                hw.all_off();
                self.pump_on = false;
                sink.emit(&AppEvent::Halted);
            }
        }
        self.settle(prev_state, sink);
        if !self.halted {
            self.apply_pump(hw);
        }
        self.publish_status();
    }

    /// Drain commands queued by other contexts.
    pub fn drain_commands(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        while let Ok(cmd) = COMMAND_CHANNEL.try_receive() {
            self.handle_command(cmd, hw, sink);
        }
    }

    /// Emit a status line through the sink.
    pub fn report_status(&self, battery_mv: Option<u16>, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Status(self.status_report(battery_mv)));
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Human-readable name of the current state.
    pub fn state_name(&self) -> &'static str {
        self.fsm.current_name()
    }

    pub fn error_code(&self) -> ErrorCode {
        self.ctx.error_code
    }

    /// Copy of the running statistics.
    pub fn stats(&self) -> SystemStats {
        self.ctx.stats
    }

    pub fn usage(&self) -> UsageStats {
        self.usage
    }

    pub fn fault_log(&self) -> &F {
        &self.faults
    }

    /// Last snapshot published by a tick or command.
    pub fn status(&self) -> StatusSnapshot {
        self.status.read()
    }

    /// Shared handle for reporting contexts.
    pub fn shared_status(&self) -> &SharedStatus {
        &self.status
    }

    /// Remote status line.  `err` is the most recent fault and stays
    /// reported after the error has been cleared.
    pub fn status_report(&self, battery_mv: Option<u16>) -> StatusReport {
        StatusReport {
            state: self.state_name(),
            err: self.ctx.stats.last_error_code.as_u8(),
            cycles: self.ctx.stats.cycle_count,
            bat: battery_mv,
        }
    }

    /// Level last written to the pump.
    pub fn pump_on(&self) -> bool {
        self.pump_on
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Live configuration (read-only).
    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Post-transition bookkeeping: drain the fault record, update usage
    /// and emit events.
    fn settle(&mut self, prev: StateId, sink: &mut impl EventSink) {
        if let Some(record) = self.ctx.pending_fault.take() {
            self.faults.append(record);
            sink.emit(&AppEvent::FaultRecorded(record));
        }

        let next = self.fsm.current_state();
        if next == prev {
            return;
        }

        if prev == StateId::Filling {
            let run_ms = u64::from(self.ctx.stats.last_fill_duration_ms);
            self.usage
                .record_fill(run_ms, self.ctx.config.pump_flow_ml_per_sec);
            if next == StateId::Cooldown {
                sink.emit(&AppEvent::DutyCycleBreach);
            }
        }
        if prev == StateId::Error {
            sink.emit(&AppEvent::ErrorCleared);
        }
        sink.emit(&AppEvent::StateChanged {
            from: prev,
            to: next,
        });
    }

    /// Translate the FSM pump command into a port call.
    fn apply_pump(&mut self, hw: &mut impl ActuatorPort) {
        let on = self.ctx.commands.pump_on
            && self.fsm.current_state() == StateId::Filling
            && !self.halted;
        hw.set_pump(on);
        self.pump_on = on;
    }

    fn publish_status(&self) {
        self.status.publish(StatusSnapshot {
            state: self.fsm.current_state(),
            error_code: self.ctx.error_code,
            pump_on: self.pump_on,
            halted: self.halted,
            stats: self.ctx.stats,
        });
    }
}
