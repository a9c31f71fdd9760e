//! Error types for the timer engine

use crate::timer::Weekday;

/// Errors produced by the registry, the record codec and the state store.
///
/// Every variant is recoverable: the registry is left unchanged when an
/// operation fails.
#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    /// A timer with this name already exists.
    #[error("a timer named '{0}' already exists")]
    DuplicateName(String),

    /// Timer names must contain at least one non-whitespace character.
    #[error("timer name must not be empty")]
    EmptyName,

    /// No timer with this name exists.
    #[error("no timer named '{0}'")]
    NotFound(String),

    /// The timer is restricted to other weekdays.
    #[error("timer '{name}' is not available on {today}")]
    UnavailableToday { name: String, today: Weekday },

    /// A persisted record is missing a field or has a field of the wrong type.
    #[error("malformed timer record: {0}")]
    MalformedRecord(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The shared registry mutex was poisoned.
    #[error("failed to lock timers: {0}")]
    Lock(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, TimerError>;
