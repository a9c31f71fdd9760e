//! Persisted form of a timer

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    entity::{Break, Color, Recurrence},
    weekday::Weekday,
};
use crate::error::{Result, TimerError};

/// One entry of the timer file. Field names match the on-disk format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerRecord {
    pub name: String,
    /// Target duration in seconds
    pub duration: u64,
    /// Elapsed time in whole seconds
    #[serde(rename = "timePassed")]
    pub time_passed: u64,
    #[serde(rename = "type")]
    pub recurrence: Recurrence,
    pub color: Color,
    pub days: BTreeSet<Weekday>,
    /// Older files predate breaks
    #[serde(default)]
    pub breaks: Vec<Break>,
}

impl TimerRecord {
    /// Decode one record, reporting missing or mistyped fields as `MalformedRecord`
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| TimerError::MalformedRecord(e.to_string()))
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
