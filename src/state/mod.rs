//! State management module
//!
//! This module contains the panel state, views and the timer status snapshot.

pub mod app_state;
pub mod timer_state;
pub mod view;

// Re-export main types
pub use app_state::AppState;
pub use timer_state::{ButtonState, TimerStatus};
pub use view::View;
