//! Timerwise - recurring daily and weekly productivity timers
//!
//! This library tracks elapsed time against named timers, runs at most one
//! of them at a time, resets progress when a day or week boundary passes,
//! and saves that state across restarts. The daemon binary wraps it in a
//! small HTTP control API.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod persistence;
pub mod state;
pub mod tasks;
pub mod timer;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use clock::{CalendarMarker, Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{Result, TimerError};
pub use persistence::StateStore;
pub use state::{AppState, SavedState, Tick, TimerUpdate, Timers};
pub use timer::{Break, Color, DayFilter, Recurrence, Timer, TimerSpec, Weekday};
pub use utils::signals::shutdown_signal;
