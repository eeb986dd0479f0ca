//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, push to a remote
//! monitor, etc.

use serde::Serialize;

use crate::diagnostics::{DiagnosticSummary, FaultRecord};
use crate::fsm::StateId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(StateId),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// A fault was latched and written to the fault log.
    FaultRecorded(FaultRecord),

    /// The duty-cycle limiter forced a cooldown.
    DutyCycleBreach,

    /// The controller left `Error`.
    ErrorCleared,

    /// Door-hold diagnostics were triggered.
    Diagnostics(DiagnosticSummary),

    /// Periodic status line.
    Status(StatusReport),

    /// The service halted on request.
    Halted,
}

/// Compact status line for a remote monitor.
///
/// Serialises as `{"state":"IDLE","err":0,"cycles":123,"bat":3300}`;
/// `bat` is omitted when no battery monitor is fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub state: &'static str,
    pub err: u8,
    pub cycles: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bat: Option<u16>,
}

impl StatusReport {
    /// Render as a single JSON line (no trailing newline).
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
