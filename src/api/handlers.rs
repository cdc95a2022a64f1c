//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{info, warn};

use crate::{error::PanelError, state::AppState};
use super::responses::{
    status_code, ApiError, ApiResponse, HealthResponse, SerialStatus, StatusResponse,
    VisibilityRequest,
};

/// Log a refused operation and turn it into an error response
fn reject(action: &str, error: PanelError) -> ApiError {
    let code = status_code(&error);
    warn!("{} refused: {}", action, error);
    (code, Json(ApiResponse::from(error)))
}

/// Handle POST /view/:name - Switch the panel view
pub async fn view_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let view = state.navigate(&name).await.map_err(|e| reject("Navigation", e))?;
    let mut response = ApiResponse::ok(format!("Showing {} view", view.as_str()));
    if let Some(timer) = state.timer_status().await {
        response = response.with_timer(timer);
    }
    Ok(Json(response))
}

/// Handle POST /timer/toggle - Start, pause or resume the current timer
pub async fn toggle_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, ApiError> {
    let timer = state.toggle_timer().await.map_err(|e| reject("Toggle", e))?;
    let message = if timer.running {
        format!("{} timer running", timer.kind.as_str())
    } else if timer.completed {
        format!("{} timer completed", timer.kind.as_str())
    } else {
        format!("{} timer paused", timer.kind.as_str())
    };
    info!("{}", message);
    Ok(Json(ApiResponse::ok(message).with_timer(timer)))
}

/// Handle POST /timer/reset - Return the current timer to idle
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, ApiError> {
    let timer = state.reset_timer().await.map_err(|e| reject("Reset", e))?;
    Ok(Json(
        ApiResponse::ok(format!("{} timer reset", timer.kind.as_str())).with_timer(timer),
    ))
}

/// Handle POST /visibility - Page visibility changed
pub async fn visibility_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VisibilityRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    state
        .set_visible(request.visible)
        .await
        .map_err(|e| reject("Visibility change", e))?;
    let message = if request.visible { "Panel visible" } else { "Panel hidden" };
    Ok(Json(ApiResponse::ok(message.to_string())))
}

/// Handle POST /serial/pair - Open the serial device
pub async fn pair_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, ApiError> {
    let pins = state.pair_serial().await.map_err(|e| reject("Pairing", e))?;
    Ok(Json(
        ApiResponse::ok("Serial connected!".to_string()).with_pins(pins),
    ))
}

/// Handle POST /control/pin/:pin/toggle - Flip one switch pin
pub async fn pin_handler(
    State(state): State<Arc<AppState>>,
    Path(pin): Path<usize>,
) -> Result<Json<ApiResponse>, ApiError> {
    let pins = state.toggle_pin(pin).map_err(|e| reject("Pin toggle", e))?;
    Ok(Json(
        ApiResponse::ok(format!("Pin {} toggled", pin)).with_pins(pins),
    ))
}

/// Handle GET /status - Return the current panel status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let (last_action, last_action_time) = state.get_last_action();
    let pins = state.switchboard.pins();

    Ok(Json(StatusResponse {
        view: state.current_view().await,
        timer: state.timer_status().await,
        buttons: state.buttons(),
        navigation_locked: state.navigation_locked(),
        visible: state.is_visible(),
        serial: SerialStatus {
            device: state.switchboard.device().to_path_buf(),
            paired: state.switchboard.is_paired(),
            pins,
            byte: pins.byte(),
        },
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
