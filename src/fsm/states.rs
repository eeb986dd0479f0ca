//! Concrete state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.  This is the classic embedded C FSM pattern
//! expressed in safe Rust.
//!
//! ```text
//!  IDLE ──[empty, guard ok]──▶ WAIT_SETTLE ──[settled, empty, guard ok]──▶ FILLING
//!    │                            │    │                                 │  │  │
//!  [full]                  [full] │    └──[guard fails]──▶ ERROR ◀──[fault]┘  │  │
//!    ▼                            ▼                          │               │  │
//!   FULL ◀───────────────────────────────────────────[tank full]─────────────┘  │
//!    │                                                       │                  │
//!  [not full]                                   [door held open]   [duty exceeded]
//!    ▼                                                       ▼                  │
//!  COOLDOWN ◀──────────────────────────────────────────────────────────────────┘
//!    └──[interval elapsed]──▶ WAIT_SETTLE / FULL / IDLE
//!
//!  Any state but ERROR ──[door open]──▶ DOOR_OPEN ──[closed]──▶ WAIT_SETTLE
//! ```

use super::context::FsmContext;
use super::{StateDescriptor, StateId};
use crate::diagnostics::FaultRecord;
use crate::duty_cycle::DutyVerdict;
use crate::error::ErrorCode;
use crate::safety::{GuardVerdict, SafetyGuard};
use log::{error, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: StateId::Idle,
            name: StateId::Idle.name(),
            on_enter: Some(pump_off_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1: DoorOpen
        StateDescriptor {
            id: StateId::DoorOpen,
            name: StateId::DoorOpen.name(),
            on_enter: Some(pump_off_enter),
            on_exit: None,
            on_update: door_open_update,
        },
        // Index 2: WaitSettle
        StateDescriptor {
            id: StateId::WaitSettle,
            name: StateId::WaitSettle.name(),
            on_enter: Some(wait_settle_enter),
            on_exit: None,
            on_update: wait_settle_update,
        },
        // Index 3: Filling
        StateDescriptor {
            id: StateId::Filling,
            name: StateId::Filling.name(),
            on_enter: Some(filling_enter),
            on_exit: Some(filling_exit),
            on_update: filling_update,
        },
        // Index 4: Full
        StateDescriptor {
            id: StateId::Full,
            name: StateId::Full.name(),
            on_enter: Some(pump_off_enter),
            on_exit: None,
            on_update: full_update,
        },
        // Index 5: Error
        StateDescriptor {
            id: StateId::Error,
            name: StateId::Error.name(),
            on_enter: Some(error_enter),
            on_exit: Some(error_exit),
            on_update: error_update,
        },
        // Index 6: Cooldown
        StateDescriptor {
            id: StateId::Cooldown,
            name: StateId::Cooldown.name(),
            on_enter: Some(cooldown_enter),
            on_exit: None,
            on_update: cooldown_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared helpers
// ═══════════════════════════════════════════════════════════════════════════

fn pump_off_enter(ctx: &mut FsmContext) {
    ctx.commands.pump_on = false;
}

/// Run the safety guard.  A rapid-cycling verdict latches its error code
/// even when the caller stays put.
fn guard_permits(ctx: &mut FsmContext) -> bool {
    match SafetyGuard::evaluate(ctx) {
        GuardVerdict::Permitted => true,
        GuardVerdict::RapidCycling { average_ms } => {
            error!(
                "SAFETY: rapid cycling, {} cycles averaging {} ms",
                ctx.stats.cycle_count, average_ms
            );
            ctx.error_code = ErrorCode::RapidCycling;
            false
        }
        GuardVerdict::DoorOpen | GuardVerdict::IntervalNotElapsed { .. } => false,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state: tank neither filling nor known full
// ═══════════════════════════════════════════════════════════════════════════

fn idle_update(ctx: &mut FsmContext) -> Option<StateId> {
    if !ctx.sensors.door_closed {
        return Some(StateId::DoorOpen);
    }

    if ctx.sensors.tank_empty && guard_permits(ctx) {
        return Some(if ctx.config.settle_enabled {
            StateId::WaitSettle
        } else {
            StateId::Filling
        });
    }

    if ctx.sensors.tank_full {
        return Some(StateId::Full);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  DOOR_OPEN state: dispenser door open, pump locked out
// ═══════════════════════════════════════════════════════════════════════════

fn door_open_update(ctx: &mut FsmContext) -> Option<StateId> {
    if !ctx.sensors.door_closed {
        return None;
    }

    if ctx.config.settle_enabled {
        Some(StateId::WaitSettle)
    } else if ctx.sensors.tank_full {
        Some(StateId::Full)
    } else {
        Some(StateId::Idle)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  WAIT_SETTLE state: letting water settle after the door closes
// ═══════════════════════════════════════════════════════════════════════════

fn wait_settle_enter(ctx: &mut FsmContext) {
    ctx.commands.pump_on = false;
    info!(
        "WAIT_SETTLE: settling for {} ms",
        ctx.config.startup_delay_ms
    );
}

fn wait_settle_update(ctx: &mut FsmContext) -> Option<StateId> {
    if !ctx.sensors.door_closed {
        return Some(StateId::DoorOpen);
    }

    if ctx.ms_in_state() < u64::from(ctx.config.startup_delay_ms) {
        return None;
    }

    if ctx.sensors.tank_full {
        return Some(StateId::Full);
    }

    if ctx.sensors.tank_empty {
        if guard_permits(ctx) {
            return Some(StateId::Filling);
        }
        // An interval refusal leaves the code at None; the fault record
        // still carries the state and cycle count.
        warn!("WAIT_SETTLE: safety guard rejected pump start");
        return Some(StateId::Error);
    }

    Some(StateId::Idle)
}

// ═══════════════════════════════════════════════════════════════════════════
//  FILLING state: pump running
// ═══════════════════════════════════════════════════════════════════════════

fn filling_enter(ctx: &mut FsmContext) {
    ctx.commands.pump_on = true;
    ctx.pump_started_at = ctx.now_ms;
    ctx.stats.cycle_count = ctx.stats.cycle_count.saturating_add(1);
    ctx.duty.pump_started(ctx.now_ms);
    info!("FILLING: pump on, cycle #{}", ctx.stats.cycle_count);
}

fn filling_exit(ctx: &mut FsmContext) {
    ctx.finish_pump_run();
    info!(
        "FILLING: pump off after {} ms",
        ctx.stats.last_fill_duration_ms
    );
}

fn filling_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.sensors.overflow {
        error!("FILLING: overflow sensor tripped");
        ctx.error_code = ErrorCode::Overflow;
        return Some(StateId::Error);
    }

    if !ctx.sensors.door_closed {
        return Some(StateId::DoorOpen);
    }

    if ctx.sensors.tank_full {
        return Some(StateId::Full);
    }

    let verdict = ctx.duty.evaluate(
        ctx.now_ms,
        u64::from(ctx.config.duty_window_ms),
        ctx.config.max_duty_percent,
    );
    if let DutyVerdict::Exceeded { percent } = verdict {
        warn!(
            "FILLING: duty cycle {}% above {}% limit, forcing cooldown",
            percent, ctx.config.max_duty_percent
        );
        ctx.stats.error_count = ctx.stats.error_count.saturating_add(1);
        return Some(StateId::Cooldown);
    }

    if ctx.config.timeout_safety_enabled {
        let run_time = ctx.pump_run_time_ms();
        if run_time > u64::from(ctx.config.max_run_time_ms) {
            error!("FILLING: pump ran {} ms, over maximum", run_time);
            ctx.error_code = ErrorCode::PumpTimeout;
            return Some(StateId::Error);
        }
        if run_time > u64::from(ctx.config.normal_fill_time_ms) && !ctx.sensors.tank_full {
            error!("FILLING: tank not full after {} ms, supply empty", run_time);
            ctx.error_code = ErrorCode::GallonEmpty;
            return Some(StateId::Error);
        }
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  FULL state: tank full, waiting for it to be drawn down
// ═══════════════════════════════════════════════════════════════════════════

fn full_update(ctx: &mut FsmContext) -> Option<StateId> {
    if !ctx.sensors.door_closed {
        return Some(StateId::DoorOpen);
    }

    if !ctx.sensors.tank_full {
        return Some(if ctx.config.cooldown_enabled {
            StateId::Cooldown
        } else {
            StateId::WaitSettle
        });
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ERROR state: fault latched, pump off until the door is held open
// ═══════════════════════════════════════════════════════════════════════════

fn error_enter(ctx: &mut FsmContext) {
    ctx.commands.pump_on = false;
    ctx.stats.error_count = ctx.stats.error_count.saturating_add(1);
    ctx.stats.last_error_code = ctx.error_code;
    ctx.pending_fault = Some(FaultRecord {
        error_code: ctx.error_code,
        timestamp_ms: ctx.now_ms,
        state_at_fault: ctx.previous,
        cycle_count: ctx.stats.cycle_count,
    });
    warn!(
        "ERROR: pump disabled, code={} ({}) from {}",
        ctx.error_code.as_u8(),
        ctx.error_code,
        ctx.previous
    );
}

fn error_exit(_ctx: &mut FsmContext) {
    info!("ERROR: fault cleared, resuming normal operation");
}

fn error_update(ctx: &mut FsmContext) -> Option<StateId> {
    // Closing the door restarts the hold timer.
    if ctx.sensors.door_closed {
        ctx.state_entered_at = ctx.now_ms;
        return None;
    }

    if ctx.ms_in_state() >= u64::from(ctx.config.error_reset_door_ms) {
        info!(
            "ERROR: door held open {} ms, resetting",
            ctx.ms_in_state()
        );
        ctx.error_code = ErrorCode::None;
        ctx.stats.reset_cycles();
        return Some(StateId::DoorOpen);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  COOLDOWN state: enforced rest between pump runs
// ═══════════════════════════════════════════════════════════════════════════

fn cooldown_enter(ctx: &mut FsmContext) {
    ctx.commands.pump_on = false;
    info!(
        "COOLDOWN: resting for {} ms",
        ctx.config.min_pump_interval_ms
    );
}

fn cooldown_update(ctx: &mut FsmContext) -> Option<StateId> {
    if !ctx.sensors.door_closed {
        return Some(StateId::DoorOpen);
    }

    if ctx.ms_in_state() < u64::from(ctx.config.min_pump_interval_ms) {
        return None;
    }

    if ctx.sensors.tank_empty {
        Some(StateId::WaitSettle)
    } else if ctx.sensors.tank_full {
        Some(StateId::Full)
    } else {
        Some(StateId::Idle)
    }
}
