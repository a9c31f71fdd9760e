//! State management module
//!
//! This module contains the timer registry and the shared application state
//! wrapped around it.

pub mod active_timer;
pub mod app_state;
pub mod events;
pub mod registry;

// Re-export main types
pub use active_timer::ActiveTimer;
pub use app_state::AppState;
pub use events::TimerEvent;
pub use registry::{Rollover, SavedState, Tick, TimerUpdate, Timers};
