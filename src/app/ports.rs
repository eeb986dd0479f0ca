//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (switch inputs, pump relay, indicator LEDs, fault log,
//! storage, watchdog, clock) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the domain core never touches hardware directly.
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - All port errors are typed; callers must handle every variant explicitly.

use crate::config::SystemConfig;
use crate::diagnostics::FaultRecord;
use crate::drivers::led_patterns::LedOutputs;
use crate::error::{SensorError, WatchdogError};
use crate::fsm::context::SensorSnapshot;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain switch states.
pub trait SensorPort {
    /// Sample every input and return a debounced, polarity-normalised
    /// snapshot as of `now_ms`.
    fn read_all(&mut self, now_ms: u64) -> SensorSnapshot;

    /// One-shot plausibility check run at boot.
    fn self_test(&mut self, now_ms: u64) -> Result<(), SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command outputs.
pub trait ActuatorPort {
    /// Drive the pump.  Called exactly once per control tick.
    fn set_pump(&mut self, on: bool);

    /// Drive both indicator LEDs.
    fn set_indicators(&mut self, leds: LedOutputs);

    /// Kill the pump and LEDs for a safe shutdown.
    fn all_off(&mut self) {
        self.set_pump(false);
        self.set_indicators(LedOutputs::OFF);
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Fault log port
// ───────────────────────────────────────────────────────────────

/// Receives one record per `Error` entry.
pub trait FaultLogPort {
    fn append(&mut self, record: FaultRecord);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ConfigError::NotFound`] if nothing was stored yet.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ flash)
// ───────────────────────────────────────────────────────────────

/// Flash-backed blob store holding the config page and the fault ring.
///
/// A blob is addressed by `(namespace, key)`.  A write replaces the whole
/// blob or leaves the old one in place.
pub trait StoragePort {
    /// Copy the blob into `buf`, returning how many bytes were copied.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Remove a blob.  Removing a missing blob is not an error.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Watchdog and clock
// ───────────────────────────────────────────────────────────────

/// Independent watchdog fed by the control loop.
pub trait WatchdogPort {
    fn feed(&mut self, now_ms: u64) -> Result<(), WatchdogError>;
}

/// Monotonic millisecond clock.
pub trait TimePort {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Nothing stored yet; first power-up.
    NotFound,
    /// Foreign magic, unknown format version or undecodable payload.
    Corrupted,
    /// Names the offending field and its allowed range.
    ValidationFailed(&'static str),
    StorageFull,
    IoError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    NotFound,
    /// No room for another blob.
    Full,
    IoError,
    /// Blob present but its contents do not decode.
    Corrupted,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => f.write_str("no stored configuration"),
            Self::Corrupted => f.write_str("stored configuration unreadable"),
            Self::ValidationFailed(field) => write!(f, "invalid configuration: {field}"),
            Self::StorageFull => f.write_str("configuration does not fit in storage"),
            Self::IoError => f.write_str("configuration storage I/O failure"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => f.write_str("blob not found"),
            Self::Full => f.write_str("storage full"),
            Self::IoError => f.write_str("storage I/O failure"),
            Self::Corrupted => f.write_str("blob corrupted"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl core::error::Error for StorageError {}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => Self::NotFound,
            StorageError::Full => Self::StorageFull,
            StorageError::IoError => Self::IoError,
            StorageError::Corrupted => Self::Corrupted,
        }
    }
}
