//! Persistence module
//!
//! This module reads and writes the registry's saved state.

pub mod store;

// Re-export main types
pub use store::{decode_records, StateStore, MARKERS_FILE, TIMERS_FILE};
