//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (serial console in production, stderr on the host).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            AppEvent::FaultRecorded(r) => {
                warn!(
                    "FAULT | code={} ({}) t={}ms from={} cycles={}",
                    r.error_code.as_u8(),
                    r.error_code,
                    r.timestamp_ms,
                    r.state_at_fault,
                    r.cycle_count
                );
            }
            AppEvent::DutyCycleBreach => {
                warn!("DUTY  | limit exceeded, cooling down");
            }
            AppEvent::ErrorCleared => {
                info!("FAULT | cleared");
            }
            AppEvent::Diagnostics(d) => {
                info!(
                    "DIAG  | door={} full={} errors={} cycle_tens={}",
                    if d.door_closed { "CLOSED" } else { "OPEN" },
                    if d.tank_full { "FULL" } else { "NOT_FULL" },
                    d.error_blinks,
                    d.cycle_tens
                );
            }
            AppEvent::Status(report) => match report.to_json_line() {
                Ok(line) => info!("STATUS | {}", line),
                Err(e) => warn!("STATUS | encode failed: {}", e),
            },
            AppEvent::Halted => {
                warn!("HALT  | controller stopped");
            }
        }
    }
}
