//! Field Timer - a control panel server for competition countdown timers
//!
//! This library provides the Match and Skills countdown timers, the serial
//! switchboard that drives the field device's enable line, and the HTTP API
//! the browser panel talks to.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod timer;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{LinkError, PanelError};
pub use state::AppState;
pub use timer::{CountdownTimer, TimerConfig, TimerKind};
pub use utils::signals::shutdown_signal;
