//! Timer status snapshot

use serde::{Deserialize, Serialize};

use crate::timer::{Phase, TimerKind};

/// Committed state of one timer, published after every mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerStatus {
    pub kind: TimerKind,
    pub phase: Phase,
    pub running: bool,
    pub active: bool,
    pub completed: bool,
    pub target_ms: u64,
    pub accumulated_ms: u64,
    pub remaining_ms: u64,
    /// Remaining time as `M:SS`
    pub display: String,
    /// Percentage of the period still remaining, 0..=100
    pub percent: f64,
    pub warning_fired: bool,
}

impl TimerStatus {
    /// Label and reset-button visibility for the start button
    pub fn button_state(&self) -> ButtonState {
        ButtonState::derive(self.running, self.active, self.completed)
    }
}

/// What the start/reset buttons should show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonState {
    pub label: String,
    pub reset_visible: bool,
}

impl ButtonState {
    pub fn derive(running: bool, active: bool, completed: bool) -> Self {
        let (label, reset_visible) = if running {
            ("Pause", false)
        } else if completed {
            ("Start", true)
        } else if active {
            ("Resume", true)
        } else {
            ("Start", false)
        };

        Self {
            label: label.to_string(),
            reset_visible,
        }
    }
}

impl Default for ButtonState {
    fn default() -> Self {
        Self::derive(false, false, false)
    }
}
