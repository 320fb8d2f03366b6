//! HTTP surface exercised through the router without a socket

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tokio::{sync::mpsc, task::yield_now};
use tower::ServiceExt;
use workout_timer::{
    create_router,
    services::SyncStore,
    state::{AppState, DeviceSync},
    tasks::{report_listener_task, spawn_timer_engine},
    TimerController,
};

fn app(sync: Option<DeviceSync>) -> Router {
    let (commands, reports) = spawn_timer_engine();
    let timer = Arc::new(TimerController::new(commands, || {}));
    tokio::spawn(report_listener_task(Arc::clone(&timer), reports));
    let state = AppState::new(timer, sync, 90, 0, "127.0.0.1".to_string());
    create_router(Arc::new(state))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    let request = request
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    for _ in 0..16 {
        yield_now().await;
    }
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test(start_paused = true)]
async fn start_pause_resume_stop_round() {
    let app = app(None);

    let (status, body) = call(&app, "POST", "/timer/start", Some(r#"{"duration":30}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["phase"], "running");
    assert_eq!(body["timer"]["is_active"], true);

    let (status, body) = call(&app, "POST", "/timer/pause", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["phase"], "paused");

    let (status, _) = call(&app, "POST", "/timer/pause", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call(&app, "POST", "/timer/resume", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["phase"], "running");

    let (status, body) = call(&app, "POST", "/timer/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["phase"], "idle");
    assert_eq!(body["timer"]["is_active"], false);
}

#[tokio::test(start_paused = true)]
async fn zero_duration_is_a_bad_request() {
    let app = app(None);
    let (status, body) = call(&app, "POST", "/timer/start", Some(r#"{"duration":0}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn oversized_duration_is_a_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let sync = DeviceSync::new(
        "phone".to_string(),
        "alex".to_string(),
        SyncStore::new(dir.path()),
    );
    let app = app(Some(sync));

    let (status, _) = call(
        &app,
        "POST",
        "/timer/start",
        Some(r#"{"duration":10000000000000000}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(&app, "POST", "/timer/reset", Some(r#"{"duration":86401}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing was started, so there is nothing to pause or resume.
    let (status, _) = call(&app, "POST", "/timer/pause", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = call(&app, "POST", "/timer/resume", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test(start_paused = true)]
async fn reset_without_body_uses_default_duration() {
    let app = app(None);
    let (status, body) = call(&app, "POST", "/timer/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["seconds_remaining"], 90);

    let (_, body) = call(&app, "POST", "/timer/reset", Some(r#"{"duration":15}"#)).await;
    assert_eq!(body["timer"]["seconds_remaining"], 15);
}

#[tokio::test(start_paused = true)]
async fn takeover_without_sync_is_not_found() {
    let app = app(None);
    let (status, _) = call(&app, "POST", "/sync/takeover", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_reports_engine_and_sync() {
    let dir = tempfile::tempdir().unwrap();
    let sync = DeviceSync::new("tablet".to_string(), "alex".to_string(), SyncStore::new(dir.path()));
    let app = app(Some(sync));

    call(&app, "POST", "/timer/start", Some(r#"{"duration":30}"#)).await;
    let (status, body) = call(&app, "GET", "/status", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["engine_available"], true);
    assert_eq!(body["device_id"], "tablet");
    assert_eq!(body["sync"]["role"], "master");
    assert_eq!(body["last_action"], "start");
}

#[tokio::test(start_paused = true)]
async fn dead_engine_is_service_unavailable() {
    let (commands, command_rx) = mpsc::unbounded_channel();
    drop(command_rx);
    let timer = Arc::new(TimerController::new(commands, || {}));
    let app = create_router(Arc::new(AppState::new(timer, None, 60, 0, "127.0.0.1".to_string())));

    let (status, _) = call(&app, "POST", "/timer/start", Some(r#"{"duration":30}"#)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (_, body) = call(&app, "GET", "/status", None).await;
    assert_eq!(body["engine_available"], false);
}

#[tokio::test]
async fn health_is_ok() {
    let app = app(None);
    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
