//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{error, info, warn};

use super::responses::{ApiResponse, HealthResponse, ResetRequest, StartRequest, StatusResponse};
use crate::{
    error::{Result, TimerError},
    state::{AppState, TimerState},
};

type Reply = (StatusCode, Json<ApiResponse>);

/// Handle POST /timer/start - Start a fresh countdown
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRequest>,
) -> Reply {
    let result = state.start(request.duration).await;
    reply(&state, result, format!("Countdown of {}s started", request.duration))
}

/// Handle POST /timer/stop - Stop the countdown
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Reply {
    let result = state.stop().await;
    reply(&state, result, "Countdown stopped".to_string())
}

/// Handle POST /timer/pause - Pause the running countdown
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Reply {
    let result = state.pause().await;
    reply(&state, result, "Countdown paused".to_string())
}

/// Handle POST /timer/resume - Resume the paused countdown
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> Reply {
    let result = state.resume().await;
    reply(&state, result, "Countdown resumed".to_string())
}

/// Handle POST /timer/reset - Stop and show a duration on the idle timer
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    request: Option<Json<ResetRequest>>,
) -> Reply {
    let Json(request) = request.unwrap_or_default();
    let result = state.reset(request.duration).await;
    reply(&state, result, "Timer reset".to_string())
}

/// Handle POST /sync/takeover - Become master of the shared countdown
pub async fn takeover_handler(State(state): State<Arc<AppState>>) -> Reply {
    let result = state.take_over().await;
    reply(&state, result, "Took over shared countdown".to_string())
}

/// Handle GET /status - Return current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer: state.timer.snapshot(),
        engine_available: !state.timer.is_degraded(),
        device_id: state.sync.as_ref().map(|sync| sync.device_id().to_string()),
        sync: state.sync_status(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

fn reply(state: &AppState, result: Result<TimerState>, message: String) -> Reply {
    match result {
        Ok(timer) => {
            info!("{}", message);
            (StatusCode::OK, Json(ApiResponse::ok(message, timer)))
        }
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("Timer request failed: {}", e);
            } else {
                warn!("Timer request rejected: {}", e);
            }
            (status, Json(ApiResponse::error(e.to_string(), state.timer.snapshot())))
        }
    }
}

fn status_for(error: &TimerError) -> StatusCode {
    match error {
        TimerError::InvalidDuration => StatusCode::BAD_REQUEST,
        TimerError::InvalidTransition { .. } => StatusCode::CONFLICT,
        TimerError::NoSharedTimer => StatusCode::NOT_FOUND,
        TimerError::EngineUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        TimerError::ReadRecord { .. }
        | TimerError::WriteRecord { .. }
        | TimerError::ParseRecord { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
