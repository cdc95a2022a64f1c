//! Background tasks module
//!
//! This module contains the task that drives each timer instance.

pub mod timer_driver;

// Re-export main types
pub use timer_driver::{timer_driver_task, TimerCommand, TimerHandle};
