//! System configuration parameters
//!
//! All tunable parameters for the refill controller.  Loaded once at boot
//! (from storage via [`ConfigPort`](crate::app::ports::ConfigPort) or the
//! defaults below) and never mutated while the control loop runs.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::drivers::output::OutputPolarity;
use crate::sensors::polarity::{ActiveLevel, InputPolarity, SwitchType};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Pump timing ---
    /// Expected time to fill the tank.  Running past this without the
    /// tank reading full means the supply is empty.
    pub normal_fill_time_ms: u32,
    /// Hard ceiling on a single pump run.
    pub max_run_time_ms: u32,
    /// Minimum pause between the end of one run and the start of the next.
    pub min_pump_interval_ms: u32,
    /// Settle delay after the door closes before the pump may start.
    pub startup_delay_ms: u32,

    // --- Rapid cycling ---
    /// Cycle count above which the average run time is checked.
    pub rapid_cycle_threshold: u32,
    /// Minimum average on-time per cycle once the threshold is passed.
    pub min_avg_cycle_time_ms: u32,

    // --- Duty cycle ---
    /// Span of the non-carrying duty window.
    pub duty_window_ms: u32,
    /// Maximum pump on-time inside the window (1-100 %).
    pub max_duty_percent: u8,

    // --- Error recovery ---
    /// How long the door must stay open to clear a latched fault.
    pub error_reset_door_ms: u32,

    // --- Features ---
    pub settle_enabled: bool,
    /// Enables the Cooldown state and the minimum-interval guard rule.
    pub cooldown_enabled: bool,
    /// Gates the pump-timeout and supply-empty checks.
    pub timeout_safety_enabled: bool,
    pub rapid_cycle_check_enabled: bool,
    pub overflow_sensor_enabled: bool,

    // --- Sensors ---
    /// A raw level must be stable this long before it is accepted.
    pub debounce_ms: u32,
    pub door_polarity: InputPolarity,
    pub water_polarity: InputPolarity,
    pub overflow_polarity: InputPolarity,

    // --- Outputs ---
    pub pump_output: OutputPolarity,
    pub program_led_output: OutputPolarity,
    pub status_led_output: OutputPolarity,

    // --- Indicators ---
    pub led_blink_fast_ms: u32,
    pub led_blink_slow_ms: u32,
    pub led_blink_error_ms: u32,

    // --- Usage estimation ---
    /// Estimated pump delivery rate used for volume statistics.
    pub pump_flow_ml_per_sec: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Pump timing
            normal_fill_time_ms: 360_000, // 6 min
            max_run_time_ms: 540_000,     // 9 min, ~1.5x normal
            min_pump_interval_ms: 10_000,
            startup_delay_ms: 2_000,

            // Rapid cycling
            rapid_cycle_threshold: 10,
            min_avg_cycle_time_ms: 30_000,

            // Duty cycle (100 % = no forced cooldown)
            duty_window_ms: 600_000,
            max_duty_percent: 100,

            // Error recovery
            error_reset_door_ms: 3_000,

            // Features
            settle_enabled: true,
            cooldown_enabled: true,
            timeout_safety_enabled: true,
            rapid_cycle_check_enabled: true,
            overflow_sensor_enabled: false,

            // Sensors
            debounce_ms: 100,
            door_polarity: InputPolarity::new(SwitchType::NormallyClosed, ActiveLevel::Low),
            water_polarity: InputPolarity::new(SwitchType::NormallyOpen, ActiveLevel::Low),
            overflow_polarity: InputPolarity::new(SwitchType::NormallyOpen, ActiveLevel::Low),

            // Outputs
            pump_output: OutputPolarity::ActiveHigh,
            program_led_output: OutputPolarity::ActiveLow,
            status_led_output: OutputPolarity::ActiveHigh,

            // Indicators
            led_blink_fast_ms: 250,
            led_blink_slow_ms: 500,
            led_blink_error_ms: 125,

            pump_flow_ml_per_sec: 20,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1_000..=3_600_000).contains(&self.normal_fill_time_ms) {
            return Err(ConfigError::ValidationFailed(
                "normal_fill_time_ms must be 1 s - 60 min",
            ));
        }
        if self.max_run_time_ms <= self.normal_fill_time_ms {
            return Err(ConfigError::ValidationFailed(
                "max_run_time_ms must exceed normal_fill_time_ms",
            ));
        }
        if self.max_run_time_ms > 7_200_000 {
            return Err(ConfigError::ValidationFailed(
                "max_run_time_ms must be at most 2 h",
            ));
        }
        if self.min_pump_interval_ms > 600_000 {
            return Err(ConfigError::ValidationFailed(
                "min_pump_interval_ms must be at most 10 min",
            ));
        }
        if self.startup_delay_ms > 60_000 {
            return Err(ConfigError::ValidationFailed(
                "startup_delay_ms must be at most 60 s",
            ));
        }
        if self.rapid_cycle_threshold == 0 {
            return Err(ConfigError::ValidationFailed(
                "rapid_cycle_threshold must be non-zero",
            ));
        }
        if self.duty_window_ms < 1_000 {
            return Err(ConfigError::ValidationFailed(
                "duty_window_ms must be at least 1 s",
            ));
        }
        if !(1..=100).contains(&self.max_duty_percent) {
            return Err(ConfigError::ValidationFailed(
                "max_duty_percent must be 1-100",
            ));
        }
        if !(100..=60_000).contains(&self.error_reset_door_ms) {
            return Err(ConfigError::ValidationFailed(
                "error_reset_door_ms must be 100 ms - 60 s",
            ));
        }
        if self.debounce_ms > 1_000 {
            return Err(ConfigError::ValidationFailed(
                "debounce_ms must be at most 1 s",
            ));
        }
        for period in [
            self.led_blink_fast_ms,
            self.led_blink_slow_ms,
            self.led_blink_error_ms,
        ] {
            if !(20..=5_000).contains(&period) {
                return Err(ConfigError::ValidationFailed(
                    "LED blink periods must be 20 ms - 5 s",
                ));
            }
        }
        if self.pump_flow_ml_per_sec == 0 {
            return Err(ConfigError::ValidationFailed(
                "pump_flow_ml_per_sec must be non-zero",
            ));
        }
        Ok(())
    }
}
