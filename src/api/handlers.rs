//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::{
    error::Error,
    state::{AppState, EngineEvent, Stats, StatusSnapshot},
};
use super::responses::{ApiResponse, HealthResponse, OverrideResponse, StatusResponse};

type Rejection = (StatusCode, Json<ApiResponse>);

/// Map an engine error onto an HTTP status and error body
fn reject(action: &str, e: Error) -> Rejection {
    let status = match e {
        Error::InvalidTransition { .. } => {
            warn!("Rejected {} request: {}", action, e);
            StatusCode::CONFLICT
        }
        _ => {
            error!("Failed to {}: {}", action, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ApiResponse::error(e.to_string())))
}

fn respond(
    action: &str,
    message: &str,
    result: Result<StatusSnapshot, Error>,
) -> Result<Json<ApiResponse>, Rejection> {
    match result {
        Ok(snapshot) => {
            info!("{} endpoint called", action);
            Ok(Json(ApiResponse::ok(message.to_string(), snapshot)))
        }
        Err(e) => Err(reject(action, e)),
    }
}

/// Handle POST /start - Begin the work/break cycle
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, Rejection> {
    respond("start", "Timer started", state.start())
}

/// Handle POST /pause - Freeze the work countdown
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, Rejection> {
    respond("pause", "Timer paused", state.pause())
}

/// Handle POST /resume - Continue the work countdown
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, Rejection> {
    respond("resume", "Timer resumed", state.resume())
}

/// Handle POST /stop - Return to idle
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, Rejection> {
    respond("stop", "Timer stopped", state.stop())
}

/// Handle POST /break - Start a break immediately
pub async fn break_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, Rejection> {
    let message = match state.force_break() {
        Ok(EngineEvent::BreakStarted { message, .. }) => message,
        Ok(_) => String::new(),
        Err(e) => return Err(reject("break", e)),
    };
    let snapshot = state.snapshot().map_err(|e| reject("break", e))?;
    info!("Break endpoint called - break forced");
    Ok(Json(ApiResponse::ok(format!("Break started: {}", message), snapshot)))
}

/// Handle POST /override - End the current break early
pub async fn override_handler(State(state): State<Arc<AppState>>) -> Result<Json<OverrideResponse>, Rejection> {
    let outcome = state.request_override().map_err(|e| reject("override", e))?;

    if let Some(e) = &outcome.persist_error {
        error!("{}: {}", unsaved_override_context(outcome.granted), e);
    }

    let message = if outcome.granted {
        format!("Break ended, {} override(s) remaining today", outcome.remaining)
    } else {
        "No overrides left today, please complete the break".to_string()
    };

    Ok(Json(OverrideResponse {
        granted: outcome.granted,
        overrides_remaining: outcome.remaining,
        persisted: outcome.persist_error.is_none(),
        message,
        timestamp: Utc::now(),
    }))
}

/// A denied attempt can only carry the daily rollover's write failure
fn unsaved_override_context(granted: bool) -> &'static str {
    if granted {
        "Override granted but not persisted"
    } else {
        "Override denied, failed to persist daily rollover"
    }
}

/// Handle GET /status - Return current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = match state.snapshot() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to get timer status: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /stats - Return persisted statistics
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Result<Json<Stats>, StatusCode> {
    state.stats().map(Json).map_err(|e| {
        error!("Failed to get statistics: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
