//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod autosave;
pub mod ticker;

// Re-export main functions
pub use autosave::autosave_task;
pub use ticker::ticker_task;
