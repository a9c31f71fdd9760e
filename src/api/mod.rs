//! HTTP API module
//!
//! This module contains the endpoint handlers a presentation layer uses to
//! drive the timer registry, plus their request and response structures.

pub mod handlers;
pub mod requests;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timers", get(list_timers_handler).post(create_timer_handler))
        .route(
            "/timers/:name",
            patch(edit_timer_handler).delete(remove_timer_handler),
        )
        .route("/timers/:name/start", post(start_timer_handler))
        .route("/timers/:name/reset", post(reset_timer_handler))
        .route("/stop", post(stop_timer_handler))
        .route("/active", get(active_timer_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
