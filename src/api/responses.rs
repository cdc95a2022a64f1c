//! API response structures

use std::path::PathBuf;
use axum::{http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{LinkError, PanelError},
    services::PinState,
    state::{ButtonState, TimerStatus, View},
};

/// API response structure for panel actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pins: Option<PinState>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: &str, message: String) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            timer: None,
            pins: None,
        }
    }

    pub fn ok(message: String) -> Self {
        Self::new("ok", message)
    }

    /// Create an error response
    pub fn error(message: String) -> Self {
        Self::new("error", message)
    }

    pub fn with_timer(mut self, timer: TimerStatus) -> Self {
        self.timer = Some(timer);
        self
    }

    pub fn with_pins(mut self, pins: PinState) -> Self {
        self.pins = Some(pins);
        self
    }
}

/// Rejection returned by handlers
pub type ApiError = (StatusCode, Json<ApiResponse>);

/// HTTP status for a refused panel operation
pub fn status_code(error: &PanelError) -> StatusCode {
    match error {
        PanelError::UnknownView(_) => StatusCode::NOT_FOUND,
        PanelError::NavigationLocked(_) | PanelError::NoTimer(_) | PanelError::LinkRequired => {
            StatusCode::CONFLICT
        }
        PanelError::Link(LinkError::UnknownPin(_)) => StatusCode::BAD_REQUEST,
        PanelError::Link(_) => StatusCode::SERVICE_UNAVAILABLE,
        PanelError::TimerGone => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<PanelError> for ApiResponse {
    fn from(error: PanelError) -> Self {
        ApiResponse::error(error.to_string())
    }
}

/// Serial link details for the status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialStatus {
    pub device: PathBuf,
    pub paired: bool,
    pub pins: PinState,
    pub byte: u8,
}

/// Full panel status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub view: View,
    pub timer: Option<TimerStatus>,
    pub buttons: ButtonState,
    pub navigation_locked: bool,
    pub visible: bool,
    pub serial: SerialStatus,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Body of `POST /visibility`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VisibilityRequest {
    pub visible: bool,
}
