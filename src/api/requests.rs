//! API request structures

use std::{collections::BTreeSet, time::Duration};

use serde::Deserialize;

use crate::{
    state::TimerUpdate,
    timer::{Break, Color, DayFilter, ParseWeekdayError, Recurrence, TimerSpec, Weekday},
};

/// Body of POST /timers
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTimerRequest {
    pub name: String,
    pub duration_seconds: u64,
    #[serde(default)]
    pub color: Color,
    /// Empty means every day
    #[serde(default)]
    pub days: BTreeSet<Weekday>,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default)]
    pub breaks: Vec<Break>,
}

impl From<CreateTimerRequest> for TimerSpec {
    fn from(request: CreateTimerRequest) -> Self {
        TimerSpec::new(request.name, Duration::from_secs(request.duration_seconds))
            .color(request.color)
            .days(request.days)
            .recurrence(request.recurrence)
            .breaks(request.breaks)
    }
}

/// Body of PATCH /timers/:name; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditTimerRequest {
    pub name: Option<String>,
    pub duration_seconds: Option<u64>,
    pub color: Option<Color>,
    pub days: Option<BTreeSet<Weekday>>,
    pub recurrence: Option<Recurrence>,
    pub breaks: Option<Vec<Break>>,
}

impl From<EditTimerRequest> for TimerUpdate {
    fn from(request: EditTimerRequest) -> Self {
        TimerUpdate {
            name: request.name,
            duration: request.duration_seconds.map(Duration::from_secs),
            color: request.color,
            days: request.days,
            recurrence: request.recurrence,
            breaks: request.breaks,
        }
    }
}

/// Query of GET /timers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimerQuery {
    /// Include the running timer (default true)
    pub include_active: Option<bool>,
    /// Comma separated weekday names, `Today` allowed
    pub days: Option<String>,
}

impl TimerQuery {
    pub fn include_active(&self) -> bool {
        self.include_active.unwrap_or(true)
    }

    pub fn day_filter(&self) -> Result<Vec<DayFilter>, ParseWeekdayError> {
        self.days
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|day| !day.is_empty())
            .map(str::parse::<DayFilter>)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_filter_parses_list() {
        let query = TimerQuery {
            include_active: Some(false),
            days: Some("Today, Monday,,friday".to_string()),
        };
        assert!(!query.include_active());
        assert_eq!(
            query.day_filter().unwrap(),
            vec![
                DayFilter::Today,
                DayFilter::Day(Weekday::Monday),
                DayFilter::Day(Weekday::Friday)
            ]
        );
        assert!(TimerQuery::default().day_filter().unwrap().is_empty());
        assert!(TimerQuery::default().include_active());
    }

    #[test]
    fn day_filter_rejects_unknown_names() {
        let query = TimerQuery {
            include_active: None,
            days: Some("Monday,Someday".to_string()),
        };
        assert!(query.day_filter().is_err());
    }

    #[test]
    fn create_request_defaults() {
        let request: CreateTimerRequest =
            serde_json::from_str(r#"{"name": "Focus", "duration_seconds": 1500}"#).unwrap();
        let spec = TimerSpec::from(request);
        assert_eq!(spec, TimerSpec::new("Focus", Duration::from_secs(1500)));
    }
}
