//! Countdown timer core
//!
//! Elapsed time is banked in `accumulated_ms` whenever a run segment ends and
//! recomputed from the clock while running, so the displayed value never
//! drifts with tick cadence. The state machine is:
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            v
//!        Completed -- toggle --> Running (fresh run)
//! ```

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{
    broadcast::StateBroadcast,
    clock::Clock,
    hooks::{Cue, TimerHooks},
    scheduler::TickScheduler,
};
use crate::state::TimerStatus;

/// Remaining time at which the warning cue fires
pub const WARNING_THRESHOLD_MS: u64 = 15_000;
pub const MATCH_DURATION_MS: u64 = 105_000;
pub const SKILLS_DURATION_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    Match,
    Skills,
}

impl TimerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TimerKind::Match => "match",
            TimerKind::Skills => "skills",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerConfig {
    pub kind: TimerKind,
    pub target_duration_ms: u64,
    pub warning_threshold_ms: u64,
}

impl TimerConfig {
    pub fn new(kind: TimerKind, target_duration_ms: u64) -> Self {
        Self {
            kind,
            target_duration_ms: target_duration_ms.max(1),
            warning_threshold_ms: WARNING_THRESHOLD_MS,
        }
    }

    pub fn match_period() -> Self {
        Self::new(TimerKind::Match, MATCH_DURATION_MS)
    }

    pub fn skills_period() -> Self {
        Self::new(TimerKind::Skills, SKILLS_DURATION_MS)
    }
}

/// Format remaining milliseconds as `M:SS`, rounding partial seconds up
pub fn format_remaining(remaining_ms: u64) -> String {
    let total_seconds = remaining_ms.div_ceil(1000);
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Percentage of `target_ms` still remaining, clamped to 0..=100
pub fn percent_remaining(remaining_ms: u64, target_ms: u64) -> f64 {
    if target_ms == 0 {
        return 0.0;
    }
    (remaining_ms as f64 / target_ms as f64 * 100.0).clamp(0.0, 100.0)
}

pub struct CountdownTimer {
    config: TimerConfig,
    accumulated_ms: u64,
    run_start: Option<u64>,
    warning_fired: bool,
    completion_played: bool,
    last_signal: bool,
    clock: Arc<dyn Clock>,
    hooks: TimerHooks,
    scheduler: TickScheduler,
    broadcast: Arc<StateBroadcast>,
    status_tx: watch::Sender<TimerStatus>,
}

impl CountdownTimer {
    /// Create a timer and prep it for a fresh session
    pub fn new(config: TimerConfig, clock: Arc<dyn Clock>, hooks: TimerHooks) -> Self {
        let initial = TimerStatus {
            kind: config.kind,
            phase: Phase::Idle,
            running: false,
            active: false,
            completed: false,
            target_ms: config.target_duration_ms,
            accumulated_ms: 0,
            remaining_ms: config.target_duration_ms,
            display: format_remaining(config.target_duration_ms),
            percent: 100.0,
            warning_fired: false,
        };
        let (status_tx, _) = watch::channel(initial);

        let mut timer = Self {
            config: config.clone(),
            accumulated_ms: 0,
            run_start: None,
            warning_fired: false,
            completion_played: false,
            last_signal: false,
            clock,
            hooks,
            scheduler: TickScheduler::new(),
            broadcast: Arc::new(StateBroadcast::new()),
            status_tx,
        };
        timer.prep(config.target_duration_ms);
        timer
    }

    /// Initialize for a new session with the given period
    pub fn prep(&mut self, target_duration_ms: u64) {
        self.config.target_duration_ms = target_duration_ms.max(1);
        info!(
            "Prepping {} timer for {}ms",
            self.config.kind.as_str(),
            self.config.target_duration_ms
        );
        self.clear();
        let now = self.clock.now_ms();
        self.paint(self.config.target_duration_ms);
        self.announce(now, false);
    }

    /// Start, pause or resume
    pub fn toggle(&mut self) {
        let now = self.clock.now_ms();
        match self.run_start.take() {
            Some(start) => self.pause(now, start),
            None => self.start(now),
        }
    }

    /// Force back to idle and cancel all scheduled work
    pub fn reset(&mut self) {
        debug!("Resetting {} timer", self.config.kind.as_str());
        self.clear();
        let now = self.clock.now_ms();
        self.paint(self.config.target_duration_ms);
        self.announce(now, false);
    }

    /// Recompute remaining time, fire the warning and complete when due
    pub fn on_tick(&mut self) {
        if !self.is_running() {
            return;
        }
        let now = self.clock.now_ms();
        let remaining = self.remaining_ms(now);

        self.paint(remaining);

        if !self.warning_fired && remaining > 0 && remaining <= self.config.warning_threshold_ms {
            self.fire_warning();
        }

        if remaining == 0 {
            self.complete(now);
        } else {
            self.commit(now);
        }
    }

    /// Precise warning one-shot
    pub fn on_warning_due(&mut self) {
        self.scheduler.clear_warning();
        if !self.is_running() || self.warning_fired {
            return;
        }
        let now = self.clock.now_ms();
        if self.remaining_ms(now) > 0 {
            self.fire_warning();
            self.commit(now);
        }
    }

    /// Precise end one-shot: force a final tick at the deadline
    pub fn on_end_due(&mut self) {
        self.on_tick();
        if self.is_running() {
            // woke before the clock reached the deadline; aim again
            let now = self.clock.now_ms();
            let remaining = self.remaining_ms(now);
            self.scheduler.arm(
                now,
                remaining,
                self.config.warning_threshold_ms,
                self.warning_fired,
            );
        }
    }

    /// Record panel visibility, refreshing the display on return
    pub fn set_visible(&mut self, visible: bool) {
        if self.scheduler.set_visible(visible) {
            debug!(
                "{} timer switching to {:?} cadence",
                self.config.kind.as_str(),
                self.scheduler.cadence()
            );
            if visible {
                self.on_tick();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.run_start.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.accumulated_ms >= self.config.target_duration_ms
    }

    pub fn is_active(&self) -> bool {
        self.is_running()
            || (self.accumulated_ms > 0 && self.accumulated_ms < self.config.target_duration_ms)
    }

    pub fn phase(&self) -> Phase {
        if self.is_running() {
            Phase::Running
        } else if self.is_completed() {
            Phase::Completed
        } else if self.accumulated_ms > 0 {
            Phase::Paused
        } else {
            Phase::Idle
        }
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn accumulated_ms(&self) -> u64 {
        self.accumulated_ms
    }

    pub fn warning_fired(&self) -> bool {
        self.warning_fired
    }

    pub fn elapsed_ms(&self, now: u64) -> u64 {
        self.accumulated_ms + self.run_start.map_or(0, |start| now.saturating_sub(start))
    }

    pub fn remaining_ms(&self, now: u64) -> u64 {
        self.config
            .target_duration_ms
            .saturating_sub(self.elapsed_ms(now))
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    pub fn broadcast(&self) -> Arc<StateBroadcast> {
        Arc::clone(&self.broadcast)
    }

    pub fn status(&self) -> watch::Receiver<TimerStatus> {
        self.status_tx.subscribe()
    }

    fn start(&mut self, now: u64) {
        if self.accumulated_ms >= self.config.target_duration_ms {
            self.accumulated_ms = 0;
        }
        if self.accumulated_ms == 0 {
            self.warning_fired = false;
            self.completion_played = false;
        }
        self.run_start = Some(now);

        let remaining = self.remaining_ms(now);
        info!(
            "{} timer running with {}ms remaining",
            self.config.kind.as_str(),
            remaining
        );
        self.scheduler.arm(
            now,
            remaining,
            self.config.warning_threshold_ms,
            self.warning_fired,
        );
        self.paint(remaining);
        self.announce(now, true);
    }

    fn pause(&mut self, now: u64, start: u64) {
        let segment = now.saturating_sub(start);
        self.accumulated_ms =
            (self.accumulated_ms + segment).min(self.config.target_duration_ms);
        self.scheduler.cancel_all();

        if self.is_completed() {
            // the end one-shot had not landed yet
            self.complete(now);
            return;
        }

        info!(
            "{} timer paused after {}ms segment, {}ms banked",
            self.config.kind.as_str(),
            segment,
            self.accumulated_ms
        );
        self.paint(self.remaining_ms(now));
        self.announce(now, false);
    }

    fn complete(&mut self, now: u64) {
        self.accumulated_ms = self.config.target_duration_ms;
        self.run_start = None;
        self.scheduler.cancel_all();
        info!("{} timer completed", self.config.kind.as_str());
        self.paint(0);
        self.announce(now, false);

        if !self.completion_played {
            self.completion_played = true;
            self.play(Cue::Completion);
        }
    }

    fn clear(&mut self) {
        self.accumulated_ms = 0;
        self.run_start = None;
        self.warning_fired = false;
        self.completion_played = false;
        self.scheduler.cancel_all();
    }

    fn fire_warning(&mut self) {
        self.warning_fired = true;
        self.scheduler.clear_warning();
        info!("{} timer warning threshold reached", self.config.kind.as_str());
        self.play(Cue::Warning);
    }

    fn play(&self, cue: Cue) {
        if let Some(sounds) = &self.hooks.sounds {
            if let Err(e) = sounds.play(cue) {
                warn!("Failed to play {:?} cue: {:#}", cue, e);
            }
        }
    }

    fn paint(&self, remaining_ms: u64) {
        if let Some(render) = &self.hooks.render {
            render.render(
                &format_remaining(remaining_ms),
                percent_remaining(remaining_ms, self.config.target_duration_ms),
            );
        }
    }

    fn snapshot(&self, now: u64) -> TimerStatus {
        let remaining_ms = self.remaining_ms(now);
        TimerStatus {
            kind: self.config.kind,
            phase: self.phase(),
            running: self.is_running(),
            active: self.is_active(),
            completed: self.is_completed(),
            target_ms: self.config.target_duration_ms,
            accumulated_ms: self.accumulated_ms,
            remaining_ms,
            display: format_remaining(remaining_ms),
            percent: percent_remaining(remaining_ms, self.config.target_duration_ms),
            warning_fired: self.warning_fired,
        }
    }

    fn commit(&self, now: u64) {
        self.status_tx.send_replace(self.snapshot(now));
    }

    /// Commit, drive the hardware line on a change, then notify listeners
    fn announce(&mut self, now: u64, running: bool) {
        self.commit(now);

        if running != self.last_signal {
            if let Some(signal) = &self.hooks.signal {
                if let Err(e) = signal.send_enable(running) {
                    warn!("Failed to drive enable line: {}", e);
                }
            }
            self.last_signal = running;
        }

        self.broadcast.publish(running);
    }
}
