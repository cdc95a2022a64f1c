//! Error types shared across the panel

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the serial hardware link
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("serial device is not paired")]
    NotPaired,

    #[error("failed to open serial device {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serial writer has shut down")]
    Closed,

    #[error("unknown switch pin {0}, expected 0 or 1")]
    UnknownPin(usize),
}

/// Refusals raised at the panel boundary
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("cannot leave the {0} view while its timer is running")]
    NavigationLocked(&'static str),

    #[error("unknown view '{0}'")]
    UnknownView(String),

    #[error("the {0} view has no timer")]
    NoTimer(&'static str),

    #[error("Connect to serial first!")]
    LinkRequired,

    #[error("timer task is no longer running")]
    TimerGone,

    #[error(transparent)]
    Link(#[from] LinkError),
}
