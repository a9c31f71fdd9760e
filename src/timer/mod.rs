//! Timer entity module
//!
//! This module contains the recurring countdown entity, its value types
//! and its persisted record form.

pub mod entity;
pub mod record;
pub mod weekday;

// Re-export main types
pub use entity::{Break, BreakKind, Color, Recurrence, Timer, TimerId, TimerSpec};
pub use record::TimerRecord;
pub use weekday::{DayFilter, ParseWeekdayError, Weekday};
