//! Snapshot of the running timer, published on every tick

use serde::{Deserialize, Serialize};

use super::Timers;
use crate::timer::Timer;

/// What a display needs to draw the running timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveTimer {
    pub name: String,
    pub elapsed_seconds: u64,
    pub remaining_seconds: u64,
    /// `MM:SS` or `HH:MM` of the remaining time
    pub remaining: String,
    pub progress: f32,
    pub on_break: bool,
}

impl ActiveTimer {
    pub fn from_timer(timer: &Timer) -> Self {
        Self {
            name: timer.name().to_string(),
            elapsed_seconds: timer.elapsed().as_secs(),
            remaining_seconds: timer.remaining().as_secs(),
            remaining: timer.formatted_remaining(),
            progress: timer.progress(),
            on_break: timer.active_break().is_some(),
        }
    }

    /// Snapshot of the registry's active timer, if any
    pub fn of(timers: &Timers) -> Option<Self> {
        timers.active_timer().map(Self::from_timer)
    }
}
