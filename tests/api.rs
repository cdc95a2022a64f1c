//! HTTP API tests driven through the router

use std::sync::Arc;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use field_timer::{
    config::TimerSettings, create_router, services::Switchboard, AppState,
};

fn app(serial: &str) -> Router {
    let state = AppState::new(
        TimerSettings {
            match_ms: 105_000,
            skills_ms: 60_000,
        },
        Arc::new(Switchboard::new(serial)),
        None,
        20554,
        "127.0.0.1".to_string(),
    );
    create_router(Arc::new(state))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app("/nonexistent/tty");
    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn status_starts_on_control_view() {
    let app = app("/nonexistent/tty");
    let (status, body) = call(&app, "GET", "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"], "control");
    assert!(body["timer"].is_null());
    assert_eq!(body["serial"]["paired"], false);
    assert_eq!(body["buttons"]["label"], "Start");
}

#[tokio::test(start_paused = true)]
async fn match_timer_round_trip() {
    let app = app("/nonexistent/tty");

    let (status, body) = call(&app, "POST", "/view/match", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["display"], "1:45");
    assert_eq!(body["timer"]["phase"], "idle");

    let (status, body) = call(&app, "POST", "/timer/toggle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["running"], true);

    let (status, body) = call(&app, "POST", "/view/control", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "error");

    tokio::time::sleep(std::time::Duration::from_secs(30)).await;
    let (_, body) = call(&app, "POST", "/timer/toggle", None).await;
    assert_eq!(body["timer"]["phase"], "paused");
    assert_eq!(body["timer"]["display"], "1:15");

    let (_, body) = call(&app, "GET", "/status", None).await;
    assert_eq!(body["buttons"]["label"], "Resume");
    assert_eq!(body["navigation_locked"], false);

    let (status, body) = call(&app, "POST", "/timer/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["phase"], "idle");
    assert_eq!(body["timer"]["percent"], 100.0);
}

#[tokio::test]
async fn refusals_map_to_status_codes() {
    let app = app("/nonexistent/tty");

    let (status, _) = call(&app, "POST", "/view/profile", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, "POST", "/timer/toggle", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call(&app, "POST", "/control/pin/0/toggle", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Connect to serial first!");

    let (status, _) = call(&app, "POST", "/serial/pair", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    call(&app, "POST", "/view/skills", None).await;
    let (status, body) = call(&app, "POST", "/timer/toggle", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Connect to serial first!");
}

#[tokio::test]
async fn visibility_is_recorded() {
    let app = app("/nonexistent/tty");
    call(&app, "POST", "/view/match", None).await;

    let (status, _) = call(
        &app,
        "POST",
        "/visibility",
        Some(serde_json::json!({ "visible": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&app, "GET", "/status", None).await;
    assert_eq!(body["visible"], false);
}

#[tokio::test]
async fn skills_timer_drives_the_enable_line() {
    let device = std::env::temp_dir().join(format!("field-timer-api-{}.dev", std::process::id()));
    std::fs::write(&device, b"").unwrap();
    let app = app(device.to_str().unwrap());

    let (status, body) = call(&app, "POST", "/serial/pair", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pins"]["enable"], false);

    let (_, body) = call(&app, "POST", "/control/pin/1/toggle", None).await;
    assert_eq!(body["pins"]["mode"], true);

    call(&app, "POST", "/view/skills", None).await;
    let (status, body) = call(&app, "POST", "/timer/toggle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["running"], true);

    let (_, body) = call(&app, "GET", "/status", None).await;
    assert_eq!(body["serial"]["pins"]["enable"], true);
    assert_eq!(body["serial"]["byte"], 3);

    call(&app, "POST", "/timer/toggle", None).await;
    let (_, body) = call(&app, "GET", "/status", None).await;
    assert_eq!(body["serial"]["byte"], 2);

    let _ = std::fs::remove_file(&device);
}
