//! Indicator pattern engine for the program and status LEDs.
//!
//! Generates time-varying on/off levels for both LEDs.  The service calls
//! `tick()` each control cycle with the current FSM state and the elapsed
//! time; nothing here ever sleeps.
//!
//! ## Priority (highest first)
//!
//! 1. **Sequence**: a queued run of timed steps (boot splash, diagnostic
//!    blink counts).  Plays to completion, then drops away.
//! 2. **FSM state**: a steady per-state pattern.
//!
//! ## State patterns
//!
//! | State              | Program LED | Status LED          |
//! |--------------------|-------------|---------------------|
//! | Idle               | on          | off                 |
//! | DoorOpen           | fast blink  | off                 |
//! | WaitSettle/Cooldown| on          | slow blink          |
//! | Filling            | on          | fast blink          |
//! | Full               | on          | on                  |
//! | Error              | error blink | error blink, inverse|

use heapless::Deque;

use crate::config::SystemConfig;
use crate::diagnostics::DiagnosticSummary;
use crate::fsm::StateId;

/// Level of both indicator LEDs (`true` = lit).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedOutputs {
    pub program: bool,
    pub status: bool,
}

impl LedOutputs {
    pub const OFF: Self = Self {
        program: false,
        status: false,
    };
    pub const BOTH: Self = Self {
        program: true,
        status: true,
    };

    pub const fn new(program: bool, status: bool) -> Self {
        Self { program, status }
    }
}

/// Per-LED pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternId {
    Off,
    Solid,
    /// Toggle every `n` ms, starting lit.
    Blink(u32),
    /// Toggle every `n` ms, starting dark.
    BlinkInverse(u32),
}

impl PatternId {
    fn level(self, phase_ms: u32) -> bool {
        match self {
            Self::Off => false,
            Self::Solid => true,
            Self::Blink(period) => (phase_ms / period.max(1)) % 2 == 0,
            Self::BlinkInverse(period) => (phase_ms / period.max(1)) % 2 == 1,
        }
    }
}

/// One timed step of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub leds: LedOutputs,
    pub duration_ms: u32,
}

const SEQUENCE_CAPACITY: usize = 64;

// Diagnostic sequence timing.
const DIAG_INTRO_TOGGLES: usize = 8;
const DIAG_INTRO_MS: u32 = 200;
const DIAG_GAP_MS: u32 = 500;
const DIAG_FLAG_MS: u32 = 500;
const DIAG_COUNT_MS: u32 = 200;

// Boot indication timing.
const BOOT_BLINKS: usize = 3;
const BOOT_BLINK_MS: u32 = 150;
const SELF_TEST_FAIL_BLINKS: usize = 10;
const SELF_TEST_FAIL_MS: u32 = 100;

/// LED pattern engine.  Stack-allocated, no heap.
pub struct IndicatorEngine {
    phase_ms: u32,
    active: Option<StateId>,
    fast_ms: u32,
    slow_ms: u32,
    error_ms: u32,
    sequence: Deque<Step, SEQUENCE_CAPACITY>,
    step_elapsed_ms: u32,
}

impl IndicatorEngine {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            phase_ms: 0,
            active: None,
            fast_ms: config.led_blink_fast_ms,
            slow_ms: config.led_blink_slow_ms,
            error_ms: config.led_blink_error_ms,
            sequence: Deque::new(),
            step_elapsed_ms: 0,
        }
    }

    /// Program and status patterns for a state.
    pub fn patterns_for(&self, state: StateId) -> (PatternId, PatternId) {
        match state {
            StateId::Idle => (PatternId::Solid, PatternId::Off),
            StateId::DoorOpen => (PatternId::Blink(self.fast_ms), PatternId::Off),
            StateId::WaitSettle | StateId::Cooldown => {
                (PatternId::Solid, PatternId::Blink(self.slow_ms))
            }
            StateId::Filling => (PatternId::Solid, PatternId::Blink(self.fast_ms)),
            StateId::Full => (PatternId::Solid, PatternId::Solid),
            StateId::Error => (
                PatternId::Blink(self.error_ms),
                PatternId::BlinkInverse(self.error_ms),
            ),
        }
    }

    /// Advance time and return the LED levels to show.
    pub fn tick(&mut self, state: StateId, delta_ms: u32) -> LedOutputs {
        if let Some(leds) = self.advance_sequence(delta_ms) {
            return leds;
        }

        if self.active != Some(state) {
            self.active = Some(state);
            self.phase_ms = 0;
        } else {
            self.phase_ms = self.phase_ms.wrapping_add(delta_ms);
        }

        let (program, status) = self.patterns_for(state);
        LedOutputs {
            program: program.level(self.phase_ms),
            status: status.level(self.phase_ms),
        }
    }

    /// Whether a sequence is currently overriding the state pattern.
    pub fn is_playing(&self) -> bool {
        !self.sequence.is_empty()
    }

    /// Drop any queued sequence.
    pub fn cancel_sequence(&mut self) {
        self.sequence.clear();
        self.step_elapsed_ms = 0;
    }

    /// Queue the boot indication.  A failed self-test first alternates the
    /// two LEDs, then both LEDs blink together.
    pub fn play_boot(&mut self, self_test_ok: bool) {
        if !self_test_ok {
            for _ in 0..SELF_TEST_FAIL_BLINKS {
                self.push(LedOutputs::new(true, false), SELF_TEST_FAIL_MS);
                self.push(LedOutputs::new(false, true), SELF_TEST_FAIL_MS);
            }
        }
        for _ in 0..BOOT_BLINKS {
            self.push(LedOutputs::BOTH, BOOT_BLINK_MS);
            self.push(LedOutputs::OFF, BOOT_BLINK_MS);
        }
    }

    /// Queue the diagnostic blink-count readout, replacing anything queued.
    pub fn play_diagnostics(&mut self, summary: &DiagnosticSummary) {
        self.cancel_sequence();

        // Attention: program LED toggles.
        for i in 0..DIAG_INTRO_TOGGLES {
            self.push(LedOutputs::new(i % 2 == 0, false), DIAG_INTRO_MS);
        }
        self.push(LedOutputs::OFF, DIAG_GAP_MS);

        for flag in [summary.door_closed, summary.tank_full] {
            if flag {
                self.push(LedOutputs::new(false, true), DIAG_FLAG_MS);
                self.push(LedOutputs::OFF, DIAG_FLAG_MS);
            }
        }

        for _ in 0..summary.error_blinks {
            self.push(LedOutputs::new(true, false), DIAG_COUNT_MS);
            self.push(LedOutputs::OFF, DIAG_COUNT_MS);
        }

        for _ in 0..summary.cycle_tens {
            self.push(LedOutputs::new(false, true), DIAG_COUNT_MS);
            self.push(LedOutputs::OFF, DIAG_COUNT_MS);
        }
    }

    /// Total remaining length of the queued sequence.
    pub fn sequence_remaining_ms(&self) -> u32 {
        let total: u32 = self.sequence.iter().map(|s| s.duration_ms).sum();
        total.saturating_sub(self.step_elapsed_ms)
    }

    fn push(&mut self, leds: LedOutputs, duration_ms: u32) {
        // Capacity covers the longest readout; overflow just truncates.
        let _ = self.sequence.push_back(Step { leds, duration_ms });
    }

    fn advance_sequence(&mut self, delta_ms: u32) -> Option<LedOutputs> {
        if self.sequence.is_empty() {
            return None;
        }
        self.step_elapsed_ms = self.step_elapsed_ms.saturating_add(delta_ms);
        while let Some(step) = self.sequence.front().copied() {
            if self.step_elapsed_ms < step.duration_ms {
                return Some(step.leds);
            }
            self.step_elapsed_ms -= step.duration_ms;
            self.sequence.pop_front();
        }
        self.step_elapsed_ms = 0;
        // Force the state pattern to restart its phase.
        self.active = None;
        None
    }
}
