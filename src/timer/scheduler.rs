//! Tick scheduling plan
//!
//! The scheduler decides *what* should be armed: a frame cadence while the
//! panel is visible, a slower fallback cadence while it is hidden, and two
//! precise one-shots (warning and end). The timer driver task turns this plan
//! into tokio sleeps; every change bumps `generation` so the driver knows to
//! drop its old handles and build new ones.

use std::time::Duration;

/// Period of the visible-frame cadence (~60 Hz)
pub const FRAME_PERIOD: Duration = Duration::from_millis(16);
/// Period of the hidden-panel fallback cadence
pub const FALLBACK_PERIOD: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Frame,
    Fallback,
}

impl Cadence {
    pub fn period(self) -> Duration {
        match self {
            Cadence::Frame => FRAME_PERIOD,
            Cadence::Fallback => FALLBACK_PERIOD,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TickScheduler {
    visible: bool,
    armed: bool,
    warning_due: Option<u64>,
    end_due: Option<u64>,
    generation: u64,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self {
            visible: true,
            armed: false,
            warning_due: None,
            end_due: None,
            generation: 0,
        }
    }

    /// Arm ticking plus the one-shots for a run segment starting at `now`.
    ///
    /// Any previous plan is replaced. The warning one-shot is skipped when it
    /// has already fired; when the threshold is already passed it is due
    /// immediately.
    pub fn arm(&mut self, now: u64, remaining_ms: u64, warning_threshold_ms: u64, warning_fired: bool) {
        self.armed = true;
        self.warning_due = if warning_fired {
            None
        } else {
            Some(now + remaining_ms.saturating_sub(warning_threshold_ms))
        };
        self.end_due = Some(now + remaining_ms);
        self.generation += 1;
    }

    /// Cancel the cadence and both one-shots
    pub fn cancel_all(&mut self) {
        if self.armed || self.warning_due.is_some() || self.end_due.is_some() {
            self.armed = false;
            self.warning_due = None;
            self.end_due = None;
            self.generation += 1;
        }
    }

    /// Disarm the warning one-shot once it has been consumed
    pub fn clear_warning(&mut self) {
        if self.warning_due.take().is_some() {
            self.generation += 1;
        }
    }

    /// Record panel visibility. Returns true when the cadence changed.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        if self.visible == visible {
            return false;
        }
        self.visible = visible;
        self.generation += 1;
        self.armed
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Current tick cadence, `None` when nothing is running
    pub fn cadence(&self) -> Option<Cadence> {
        match (self.armed, self.visible) {
            (false, _) => None,
            (true, true) => Some(Cadence::Frame),
            (true, false) => Some(Cadence::Fallback),
        }
    }

    pub fn warning_due(&self) -> Option<u64> {
        self.warning_due
    }

    pub fn end_due(&self) -> Option<u64> {
        self.end_due
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True when no tick or one-shot would fire
    pub fn is_idle(&self) -> bool {
        !self.armed && self.warning_due.is_none() && self.end_due.is_none()
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}
