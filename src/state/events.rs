//! Change notifications broadcast by the application state

use serde::{Deserialize, Serialize};

use super::Rollover;

/// Something about the timer set changed and may need persisting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TimerEvent {
    Created { name: String },
    Started { name: String },
    Stopped,
    Completed { name: String },
    Edited { name: String },
    Reset { name: String },
    Removed { name: String },
    RolledOver { weekly: bool },
    Restored { count: usize },
}

impl TimerEvent {
    pub fn rolled_over(rollover: Rollover) -> Self {
        TimerEvent::RolledOver {
            weekly: rollover == Rollover::Weekly,
        }
    }

    /// Short label recorded as the last action
    pub fn action(&self) -> &'static str {
        match self {
            TimerEvent::Created { .. } => "create",
            TimerEvent::Started { .. } => "start",
            TimerEvent::Stopped => "stop",
            TimerEvent::Completed { .. } => "complete",
            TimerEvent::Edited { .. } => "edit",
            TimerEvent::Reset { .. } => "reset",
            TimerEvent::Removed { .. } => "remove",
            TimerEvent::RolledOver { .. } => "rollover",
            TimerEvent::Restored { .. } => "restore",
        }
    }
}
