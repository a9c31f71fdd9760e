//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{
    error::TimerError,
    state::AppState,
    timer::TimerSpec,
};
use super::{
    requests::{CreateTimerRequest, EditTimerRequest, TimerQuery},
    responses::{
        ApiResponse, ErrorResponse, HealthResponse, StatusResponse, TimerListResponse, TimerView,
    },
};

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a registry error to a status code and log it at a matching level
fn reject(context: &str, err: TimerError) -> ApiError {
    let status = match &err {
        TimerError::DuplicateName(_) | TimerError::UnavailableToday { .. } => StatusCode::CONFLICT,
        TimerError::EmptyName | TimerError::MalformedRecord(_) => StatusCode::BAD_REQUEST,
        TimerError::NotFound(_) => StatusCode::NOT_FOUND,
        TimerError::Io(_) | TimerError::Json(_) | TimerError::Lock(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        error!("{}: {}", context, err);
    } else {
        warn!("{}: {}", context, err);
    }
    (status, Json(ErrorResponse::new(err.to_string())))
}

/// Handle GET /timers - List timers, optionally filtered
pub async fn list_timers_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TimerQuery>,
) -> Result<Json<TimerListResponse>, ApiError> {
    let filter = query.day_filter().map_err(|e| {
        warn!("Rejected timer query: {}", e);
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string())))
    })?;

    let timers = state
        .read_timers(|timers| {
            let active = timers.active_timer().map(|t| t.id());
            timers
                .filtered(query.include_active(), &filter)
                .into_iter()
                .map(|t| TimerView::new(t, Some(t.id()) == active))
                .collect::<Vec<_>>()
        })
        .map_err(|e| reject("Failed to list timers", e))?;

    Ok(Json(TimerListResponse { timers }))
}

/// Handle POST /timers - Create a timer
pub async fn create_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTimerRequest>,
) -> Result<(StatusCode, Json<ApiResponse>), ApiError> {
    let spec = TimerSpec::from(request);
    let name = spec.name.trim().to_string();
    state
        .create_timer(spec)
        .map_err(|e| reject("Failed to create timer", e))?;

    info!("Create endpoint called - timer '{}' created", name);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            format!("Timer '{}' created", name),
            state.active_timer(),
        )),
    ))
}

/// Handle PATCH /timers/:name - Edit a timer in place
pub async fn edit_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(request): Json<EditTimerRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    state
        .edit_timer(&name, request.into())
        .map_err(|e| reject("Failed to edit timer", e))?;

    Ok(Json(ApiResponse::ok(
        format!("Timer '{}' updated", name),
        state.active_timer(),
    )))
}

/// Handle DELETE /timers/:name - Remove a timer
pub async fn remove_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    state
        .remove_timer(&name)
        .map_err(|e| reject("Failed to remove timer", e))?;

    info!("Remove endpoint called - timer '{}' removed", name);
    Ok(Json(ApiResponse::ok(
        format!("Timer '{}' removed", name),
        state.active_timer(),
    )))
}

/// Handle POST /timers/:name/start - Make a timer the active one
pub async fn start_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    state
        .start_timer(&name)
        .map_err(|e| reject("Failed to start timer", e))?;

    Ok(Json(ApiResponse::ok(
        format!("Timer '{}' started", name),
        state.active_timer(),
    )))
}

/// Handle POST /timers/:name/reset - Zero a timer's progress
pub async fn reset_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    state
        .reset_timer(&name)
        .map_err(|e| reject("Failed to reset timer", e))?;

    Ok(Json(ApiResponse::ok(
        format!("Timer '{}' reset", name),
        state.active_timer(),
    )))
}

/// Handle POST /stop - Stop the running timer
pub async fn stop_timer_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, ApiError> {
    let was_running = state
        .stop_timer()
        .map_err(|e| reject("Failed to stop timer", e))?;

    let message = if was_running {
        "Timer stopped"
    } else {
        "No timer was running"
    };
    Ok(Json(ApiResponse::ok(message.to_string(), None)))
}

/// Handle GET /active - Return the running timer, if any
pub async fn active_timer_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let active = state.active_timer();
    let message = match &active {
        Some(active) => format!("Timer '{}' is running", active.name),
        None => "No timer is running".to_string(),
    };
    Json(ApiResponse::ok(message, active))
}

/// Handle GET /status - Return current registry status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, ApiError> {
    let (timer_count, available_today, today, markers) = state
        .read_timers(|timers| {
            let today = timers.clock().weekday();
            let available = timers
                .timers()
                .iter()
                .filter(|t| t.is_available_on(today))
                .count();
            (timers.timers().len(), available, today, timers.markers())
        })
        .map_err(|e| reject("Failed to read timers", e))?;

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        active: state.active_timer(),
        timer_count,
        available_today,
        today,
        day_of_year: markers.map(|m| m.day),
        week_of_year: markers.map(|m| m.week),
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
