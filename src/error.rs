//! Unified error types for the refill controller.
//!
//! Two families live here:
//!
//! - [`ErrorCode`] is the *domain* fault code carried by the state machine
//!   context, written into fault records and reported on the status line.
//!   Its numeric values are part of the external status format.
//! - [`Error`] is what fallible collaborator operations (sensor reads,
//!   config loading, watchdog) return.  All variants are `Copy` so they can
//!   be passed through the control loop without allocation.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::app::ports::{ConfigError, StorageError};

// ---------------------------------------------------------------------------
// Domain fault codes
// ---------------------------------------------------------------------------

/// Fault code latched while the controller sits in `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ErrorCode {
    #[default]
    None = 0,
    /// Pump ran longer than the configured maximum.
    PumpTimeout = 1,
    /// A sensor self-test failed.
    SensorFault = 2,
    /// Cycles are too frequent and too short on average.
    RapidCycling = 3,
    /// Pump ran past the normal fill time without the tank filling.
    GallonEmpty = 4,
    /// Overflow sensor tripped while filling.
    Overflow = 5,
}

impl ErrorCode {
    /// Numeric wire value (`"err"` field of the status line).
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Inverse of [`as_u8`](Self::as_u8).  Unknown codes map to `None`.
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::PumpTimeout),
            2 => Some(Self::SensorFault),
            3 => Some(Self::RapidCycling),
            4 => Some(Self::GallonEmpty),
            5 => Some(Self::Overflow),
            _ => None,
        }
    }

    pub const fn is_fault(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::PumpTimeout => write!(f, "pump timeout"),
            Self::SensorFault => write!(f, "sensor fault"),
            Self::RapidCycling => write!(f, "rapid cycling"),
            Self::GallonEmpty => write!(f, "supply empty"),
            Self::Overflow => write!(f, "overflow"),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible collaborator operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned implausible data.
    Sensor(SensorError),
    /// An output pin could not be driven.
    Actuator(ActuatorError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// Persistent storage failed.
    Storage(StorageError),
    /// The watchdog could not be armed or fed.
    Watchdog(WatchdogError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Watchdog(e) => write!(f, "watchdog: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// GPIO read returned an error.
    GpioReadFailed,
    /// Tank reads full and empty at the same time.
    Contradictory,
    /// Overflow tripped while the tank reads empty.
    Implausible,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
            Self::Contradictory => write!(f, "tank full and empty both asserted"),
            Self::Implausible => write!(f, "overflow asserted with empty tank"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Watchdog errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogError {
    /// Feed arrived after the timeout had already elapsed.
    Expired { overdue_ms: u64 },
    /// The watchdog was fed before being armed.
    NotArmed,
}

impl fmt::Display for WatchdogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired { overdue_ms } => write!(f, "expired {overdue_ms} ms ago"),
            Self::NotArmed => write!(f, "not armed"),
        }
    }
}

impl From<WatchdogError> for Error {
    fn from(e: WatchdogError) -> Self {
        Self::Watchdog(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
