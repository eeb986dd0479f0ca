//! Input wiring polarity.
//!
//! A limit switch is described by its contact type and the pin level
//! produced when the contact is closed.  Together they decide whether a
//! raw pin level means "asserted" (door closed, water present, overflow).
//! The mapping is resolved once at construction into a plain function
//! pointer so the per-tick read path is a single call.
//!
//! | Switch | Active | Raw HIGH means |
//! |--------|--------|----------------|
//! | NO     | High   | asserted       |
//! | NO     | Low    | not asserted   |
//! | NC     | High   | not asserted   |
//! | NC     | Low    | asserted       |

use serde::{Deserialize, Serialize};

/// Contact type of a mechanical switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchType {
    NormallyOpen,
    NormallyClosed,
}

/// Pin level produced when the contact is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveLevel {
    Low,
    High,
}

/// Maps a raw pin level to the logical "asserted" value.
pub type NormaliseFn = fn(bool) -> bool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPolarity {
    pub switch: SwitchType,
    pub active: ActiveLevel,
}

impl InputPolarity {
    pub const fn new(switch: SwitchType, active: ActiveLevel) -> Self {
        Self { switch, active }
    }

    /// Whether a raw HIGH means asserted.
    pub const fn high_is_asserted(self) -> bool {
        matches!(
            (self.switch, self.active),
            (SwitchType::NormallyOpen, ActiveLevel::High)
                | (SwitchType::NormallyClosed, ActiveLevel::Low)
        )
    }

    /// Resolve to a normalising function.
    pub fn resolve(self) -> NormaliseFn {
        if self.high_is_asserted() {
            pass_through
        } else {
            inverted
        }
    }
}

fn pass_through(raw_high: bool) -> bool {
    raw_high
}

fn inverted(raw_high: bool) -> bool {
    !raw_high
}
