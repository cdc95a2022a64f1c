//! Countdown timer engine
//!
//! One generic timer parameterized by its period:
//! - **core**: elapsed-time accounting and the start/pause/complete state machine
//! - **scheduler**: which cadence and one-shots should be armed
//! - **broadcast**: running-state listeners
//! - **hooks**: injected render, sound and hardware collaborators

pub mod broadcast;
pub mod clock;
pub mod core;
pub mod hooks;
pub mod scheduler;

pub use broadcast::{StateBroadcast, Subscription};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use self::core::{
    format_remaining, percent_remaining, CountdownTimer, Phase, TimerConfig, TimerKind,
    MATCH_DURATION_MS, SKILLS_DURATION_MS, WARNING_THRESHOLD_MS,
};
pub use hooks::{Cue, RenderSink, SignalSender, SoundTrigger, TimerHooks};
pub use scheduler::{Cadence, TickScheduler};
