//! Side-effect collaborators injected into a timer

use std::sync::Arc;

use crate::error::LinkError;

/// Audible cues a timer can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Warning,
    Completion,
}

/// Paints remaining time and the percentage progress ring
pub trait RenderSink: Send + Sync {
    fn render(&self, text: &str, percent: f64);
}

/// Fire-and-forget sound playback
pub trait SoundTrigger: Send + Sync {
    fn play(&self, cue: Cue) -> anyhow::Result<()>;
}

/// Drives the external device's enable line in lockstep with the timer
pub trait SignalSender: Send + Sync {
    fn send_enable(&self, enabled: bool) -> Result<(), LinkError>;
}

/// Optional collaborators; any of them may be absent
#[derive(Clone, Default)]
pub struct TimerHooks {
    pub render: Option<Arc<dyn RenderSink>>,
    pub sounds: Option<Arc<dyn SoundTrigger>>,
    pub signal: Option<Arc<dyn SignalSender>>,
}

impl TimerHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_render(mut self, render: Arc<dyn RenderSink>) -> Self {
        self.render = Some(render);
        self
    }

    pub fn with_sounds(mut self, sounds: Arc<dyn SoundTrigger>) -> Self {
        self.sounds = Some(sounds);
        self
    }

    pub fn with_signal(mut self, signal: Arc<dyn SignalSender>) -> Self {
        self.signal = Some(signal);
        self
    }
}
