//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (serial
//! console, boot self-test, power management) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.
//!
//! Producers running outside the control loop push into
//! [`COMMAND_CHANNEL`]; the loop drains it once per tick.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Forced error clear: enter `Idle`, zero the cycle counters, keep
    /// the error history.
    ClearError,

    /// The boot self-test found an implausible sensor state.
    SensorSelfTestFailed,

    /// Stop the pump and halt the controller until reset.
    Shutdown,
}

const COMMAND_DEPTH: usize = 4;

/// Inbound command channel: any context → control loop.
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, AppCommand, COMMAND_DEPTH> =
    Channel::new();
