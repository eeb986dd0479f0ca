//! Pump-start safety guard.
//!
//! The guard is consulted by the state handlers **before** the pump may be
//! started.  It is a pure predicate over the FSM context: it never changes
//! state by itself, it only tells the caller why a start is refused.
//!
//! ## Rules, evaluated in order
//!
//! 1. The door must read closed.
//! 2. If a previous run exists, the minimum inter-cycle interval must
//!    have elapsed since it stopped (skipped when cooldown is disabled).
//! 3. Once the cycle count passes the rapid-cycle threshold, the average
//!    on-time per cycle must reach the configured minimum (skipped when
//!    rapid-cycle checking is disabled).

use crate::fsm::context::FsmContext;

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardVerdict {
    Permitted,
    DoorOpen,
    IntervalNotElapsed { remaining_ms: u64 },
    RapidCycling { average_ms: u64 },
}

impl GuardVerdict {
    pub fn is_permitted(self) -> bool {
        matches!(self, Self::Permitted)
    }
}

/// Stateless precondition gate for pump activation.
pub struct SafetyGuard;

impl SafetyGuard {
    /// Evaluate all start conditions against the context as of `ctx.now_ms`.
    pub fn evaluate(ctx: &FsmContext) -> GuardVerdict {
        if !ctx.sensors.door_closed {
            return GuardVerdict::DoorOpen;
        }

        if ctx.config.cooldown_enabled {
            if let Some(stopped) = ctx.pump_stopped_at {
                let since = ctx.now_ms.saturating_sub(stopped);
                let min = u64::from(ctx.config.min_pump_interval_ms);
                if since < min {
                    return GuardVerdict::IntervalNotElapsed {
                        remaining_ms: min - since,
                    };
                }
            }
        }

        if ctx.config.rapid_cycle_check_enabled
            && ctx.stats.cycle_count > ctx.config.rapid_cycle_threshold
        {
            if let Some(average_ms) = ctx.stats.average_cycle_time_ms() {
                if average_ms < u64::from(ctx.config.min_avg_cycle_time_ms) {
                    return GuardVerdict::RapidCycling { average_ms };
                }
            }
        }

        GuardVerdict::Permitted
    }
}
