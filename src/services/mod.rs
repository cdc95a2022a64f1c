//! External collaborators of the timers
//!
//! This module contains the serial switchboard, the sound player and the
//! display sink that the timers are wired to.

pub mod display;
pub mod serial;
pub mod sound;

// Re-export main types
pub use display::DisplayLog;
pub use serial::{status_byte, PinState, Switchboard, ENABLE_PIN, MODE_PIN};
pub use sound::SoundPlayer;
