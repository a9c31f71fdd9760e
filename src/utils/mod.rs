//! Utility functions module
//!
//! Process-level helpers used by the daemon binary.

pub mod signals;

pub use signals::shutdown_signal;
