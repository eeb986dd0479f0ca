//! Water dispenser refill controller.
//!
//! Drives a refill pump from door and tank-level switches through a
//! seven-state machine, guarded by a pump-start safety check and a
//! duty-cycle limiter.  Exposes the pure-logic modules for integration
//! testing and the host simulation binary.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod drivers;
pub mod duty_cycle;
pub mod error;
pub mod fsm;
pub mod safety;
pub mod scheduler;
pub mod sensors;
pub mod usage;

pub use error::{Error, ErrorCode, Result};
