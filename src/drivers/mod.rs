//! Actuator drivers and peripheral helpers.

pub mod led_patterns;
pub mod output;
pub mod pump;
pub mod status_led;
pub mod watchdog;
