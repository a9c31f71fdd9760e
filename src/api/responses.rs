//! API response structures

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    state::ActiveTimer,
    timer::{Break, Color, Recurrence, Timer, Weekday},
};

/// API response structure for state change endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub active: Option<ActiveTimer>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, active: Option<ActiveTimer>) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            active,
        }
    }

    /// Create a success response
    pub fn ok(message: String, active: Option<ActiveTimer>) -> Self {
        Self::new("ok".to_string(), message, active)
    }
}

/// Body returned with every non-2xx status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(message: String) -> Self {
        Self {
            status: "error".to_string(),
            message,
            timestamp: Utc::now(),
        }
    }
}

/// One timer as shown to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerView {
    pub name: String,
    pub duration_seconds: u64,
    pub elapsed_seconds: u64,
    pub remaining: String,
    pub progress: f32,
    pub recurrence: Recurrence,
    pub color: Color,
    pub days: BTreeSet<Weekday>,
    pub breaks: Vec<Break>,
    pub active: bool,
}

impl TimerView {
    pub fn new(timer: &Timer, active: bool) -> Self {
        Self {
            name: timer.name().to_string(),
            duration_seconds: timer.duration().as_secs(),
            elapsed_seconds: timer.elapsed().as_secs(),
            remaining: timer.formatted_remaining(),
            progress: timer.progress(),
            recurrence: timer.recurrence(),
            color: timer.color(),
            days: timer.days().clone(),
            breaks: timer.breaks().to_vec(),
            active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerListResponse {
    pub timers: Vec<TimerView>,
}

/// Status response with registry information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub active: Option<ActiveTimer>,
    pub timer_count: usize,
    pub available_today: usize,
    pub today: Weekday,
    pub day_of_year: Option<u32>,
    pub week_of_year: Option<u32>,
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
