//! Main application state management

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::{ButtonState, TimerStatus, View};
use crate::{
    config::TimerSettings,
    error::PanelError,
    services::{DisplayLog, PinState, Switchboard},
    tasks::TimerHandle,
    timer::{MonotonicClock, SoundTrigger, Subscription, TimerConfig, TimerHooks, TimerKind},
};

/// The view currently shown and the timer it owns
#[derive(Default)]
struct Session {
    view: View,
    timer: Option<TimerHandle>,
    subscriptions: Vec<Subscription>,
}

/// Main application state: the active view, its timer and the serial link
pub struct AppState {
    session: tokio::sync::Mutex<Session>,
    /// Set by a state listener while the current timer runs
    nav_locked: Arc<AtomicBool>,
    buttons: Arc<Mutex<ButtonState>>,
    visible: AtomicBool,
    pub settings: TimerSettings,
    pub switchboard: Arc<Switchboard>,
    sounds: Option<Arc<dyn SoundTrigger>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    pub fn new(
        settings: TimerSettings,
        switchboard: Arc<Switchboard>,
        sounds: Option<Arc<dyn SoundTrigger>>,
        port: u16,
        host: String,
    ) -> Self {
        Self {
            session: tokio::sync::Mutex::new(Session::default()),
            nav_locked: Arc::new(AtomicBool::new(false)),
            buttons: Arc::new(Mutex::new(ButtonState::default())),
            visible: AtomicBool::new(true),
            settings,
            switchboard,
            sounds,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        }
    }

    /// Switch views, dropping the old view's timer and prepping a fresh one.
    ///
    /// Refused while the current timer is running.
    pub async fn navigate(&self, name: &str) -> Result<View, PanelError> {
        let view = View::from_name(name).ok_or_else(|| PanelError::UnknownView(name.to_string()))?;
        let mut session = self.session.lock().await;

        if self.nav_locked.load(Ordering::SeqCst) {
            warn!("Navigation to {} refused, {} timer running", view.as_str(), session.view.as_str());
            return Err(PanelError::NavigationLocked(session.view.as_str()));
        }

        for subscription in session.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
        session.timer = None;
        self.nav_locked.store(false, Ordering::SeqCst);
        self.set_buttons(ButtonState::default());

        if let Some(kind) = view.timer_kind() {
            let handle = self.spawn_timer(kind);
            if !self.visible.load(Ordering::SeqCst) {
                handle.set_visible(false)?;
            }
            session.subscriptions = self.attach_listeners(&handle);
            session.timer = Some(handle);
        }

        session.view = view;
        info!("Navigated to {} view", view.as_str());
        self.record_action(&format!("view:{}", view.as_str()));
        Ok(view)
    }

    /// Start, pause or resume the current view's timer
    pub async fn toggle_timer(&self) -> Result<TimerStatus, PanelError> {
        let session = self.session.lock().await;
        let handle = session
            .timer
            .as_ref()
            .ok_or(PanelError::NoTimer(session.view.as_str()))?;

        // the skills timer drives the enable line, so it cannot start unpaired
        if handle.kind() == TimerKind::Skills
            && !handle.is_running()
            && !self.switchboard.is_paired()
        {
            warn!("Refusing to start skills timer without a paired serial device");
            return Err(PanelError::LinkRequired);
        }

        let status = handle.toggle().await?;
        self.record_action(&format!("{}:toggle", handle.kind().as_str()));
        Ok(status)
    }

    /// Reset the current view's timer to idle
    pub async fn reset_timer(&self) -> Result<TimerStatus, PanelError> {
        let session = self.session.lock().await;
        let handle = session
            .timer
            .as_ref()
            .ok_or(PanelError::NoTimer(session.view.as_str()))?;

        let status = handle.reset().await?;
        self.record_action(&format!("{}:reset", handle.kind().as_str()));
        Ok(status)
    }

    /// Stop the current view's timer before the process exits.
    ///
    /// Resetting goes through the timer's own broadcast, so listeners unlock
    /// navigation and the Skills enable line is dropped.
    pub async fn shutdown(&self) {
        let session = self.session.lock().await;
        let Some(handle) = &session.timer else {
            return;
        };
        if !handle.is_running() && !handle.is_active() {
            return;
        }

        match handle.reset().await {
            Ok(_) => info!("Stopped {} timer for shutdown", handle.kind().as_str()),
            Err(e) => warn!("Failed to stop {} timer on shutdown: {}", handle.kind().as_str(), e),
        }
    }

    /// Record whether the panel page is visible and retune the tick cadence
    pub async fn set_visible(&self, visible: bool) -> Result<(), PanelError> {
        self.visible.store(visible, Ordering::SeqCst);
        let session = self.session.lock().await;
        if let Some(handle) = &session.timer {
            handle.set_visible(visible)?;
        }
        Ok(())
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    pub async fn pair_serial(&self) -> Result<PinState, PanelError> {
        let pins = self.switchboard.pair().await?;
        self.record_action("serial:pair");
        Ok(pins)
    }

    pub fn toggle_pin(&self, pin: usize) -> Result<PinState, PanelError> {
        let pins = self.switchboard.toggle_pin(pin).map_err(|e| match e {
            crate::error::LinkError::NotPaired => PanelError::LinkRequired,
            other => PanelError::Link(other),
        })?;
        self.record_action(&format!("pin:{}", pin));
        Ok(pins)
    }

    pub async fn current_view(&self) -> View {
        self.session.lock().await.view
    }

    pub async fn timer_status(&self) -> Option<TimerStatus> {
        self.session
            .lock()
            .await
            .timer
            .as_ref()
            .map(TimerHandle::status)
    }

    pub fn buttons(&self) -> ButtonState {
        self.buttons
            .lock()
            .map(|b| b.clone())
            .unwrap_or_default()
    }

    pub fn navigation_locked(&self) -> bool {
        self.nav_locked.load(Ordering::SeqCst)
    }

    fn spawn_timer(&self, kind: TimerKind) -> TimerHandle {
        let config = match kind {
            TimerKind::Match => TimerConfig::new(kind, self.settings.match_ms),
            TimerKind::Skills => TimerConfig::new(kind, self.settings.skills_ms),
        };

        let mut hooks = TimerHooks::new().with_render(Arc::new(DisplayLog::new(kind)));
        if let Some(sounds) = &self.sounds {
            hooks = hooks.with_sounds(Arc::clone(sounds));
        }
        if kind == TimerKind::Skills {
            hooks = hooks.with_signal(self.switchboard.clone());
        }

        TimerHandle::spawn(config, MonotonicClock::new(), hooks)
    }

    /// Subscribe the navigation lock and button adapters to a new timer
    fn attach_listeners(&self, handle: &TimerHandle) -> Vec<Subscription> {
        let nav_locked = Arc::clone(&self.nav_locked);
        let nav = handle.subscribe(move |running| {
            nav_locked.store(running, Ordering::SeqCst);
            Ok(())
        });

        let buttons = Arc::clone(&self.buttons);
        let status = handle.watch();
        let button = handle.subscribe(move |running| {
            let (active, completed) = {
                let s = status.borrow();
                (s.active, s.completed)
            };
            let mut buttons = buttons
                .lock()
                .map_err(|_| anyhow::anyhow!("button state lock poisoned"))?;
            *buttons = ButtonState::derive(running, active, completed);
            Ok(())
        });

        vec![nav, button]
    }

    fn set_buttons(&self, state: ButtonState) {
        if let Ok(mut buttons) = self.buttons.lock() {
            *buttons = state;
        }
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::sleep;

    fn state() -> AppState {
        AppState::new(
            TimerSettings {
                match_ms: 105_000,
                skills_ms: 60_000,
            },
            Arc::new(Switchboard::new("/nonexistent/tty")),
            None,
            0,
            "127.0.0.1".to_string(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_is_locked_while_running() {
        let state = state();
        state.navigate("match").await.unwrap();
        state.toggle_timer().await.unwrap();
        assert!(state.navigation_locked());
        assert_eq!(state.buttons().label, "Pause");

        let err = state.navigate("control").await.unwrap_err();
        assert!(matches!(err, PanelError::NavigationLocked("match")));

        sleep(Duration::from_secs(10)).await;
        let paused = state.toggle_timer().await.unwrap();
        assert!(paused.active);
        assert!(!state.navigation_locked());
        assert_eq!(state.buttons().label, "Resume");
        assert!(state.buttons().reset_visible);

        assert_eq!(state.navigate("control").await.unwrap(), View::Control);
        assert!(state.timer_status().await.is_none());
        assert_eq!(state.buttons(), ButtonState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn completion_unlocks_navigation() {
        let state = state();
        state.navigate("match").await.unwrap();
        state.toggle_timer().await.unwrap();

        sleep(Duration::from_millis(105_100)).await;
        let status = state.timer_status().await.unwrap();
        assert!(status.completed);
        assert!(!state.navigation_locked());
        assert_eq!(state.buttons().label, "Start");
        assert!(state.buttons().reset_visible);
    }

    #[tokio::test(start_paused = true)]
    async fn skills_start_needs_a_paired_link() {
        let state = state();
        state.navigate("skills").await.unwrap();

        let err = state.toggle_timer().await.unwrap_err();
        assert!(matches!(err, PanelError::LinkRequired));
        let status = state.timer_status().await.unwrap();
        assert!(!status.running && !status.active);
        assert_eq!(status.display, "1:00");
    }

    #[tokio::test]
    async fn control_view_has_no_timer() {
        let state = state();
        assert!(matches!(
            state.toggle_timer().await,
            Err(PanelError::NoTimer("control"))
        ));
        assert!(matches!(
            state.navigate("profile").await,
            Err(PanelError::UnknownView(_))
        ));
        assert!(matches!(state.toggle_pin(0), Err(PanelError::LinkRequired)));
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_preps_a_fresh_timer() {
        let state = state();
        state.navigate("match").await.unwrap();
        state.toggle_timer().await.unwrap();
        sleep(Duration::from_secs(5)).await;
        state.toggle_timer().await.unwrap();

        state.navigate("match").await.unwrap();
        let status = state.timer_status().await.unwrap();
        assert_eq!(status.accumulated_ms, 0);
        assert_eq!(status.display, "1:45");
        assert_eq!(state.get_last_action().0.as_deref(), Some("view:match"));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_a_running_timer() {
        let state = state();
        state.navigate("match").await.unwrap();
        state.toggle_timer().await.unwrap();
        sleep(Duration::from_secs(5)).await;
        assert!(state.navigation_locked());

        state.shutdown().await;
        let status = state.timer_status().await.unwrap();
        assert!(!status.running && !status.active);
        assert!(!state.navigation_locked());
        assert_eq!(state.buttons().label, "Start");

        sleep(Duration::from_secs(200)).await;
        let status = state.timer_status().await.unwrap();
        assert!(!status.completed);
        assert_eq!(status.display, "1:45");
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_leaves_an_idle_panel_alone() {
        let state = state();
        state.shutdown().await;
        assert_eq!(state.current_view().await, View::Control);

        state.navigate("skills").await.unwrap();
        state.shutdown().await;
        let status = state.timer_status().await.unwrap();
        assert_eq!(status.display, "1:00");
        assert_eq!(state.get_last_action().0.as_deref(), Some("view:skills"));
    }
}
