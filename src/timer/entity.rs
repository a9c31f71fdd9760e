//! Timer entity and its value types

use std::{
    collections::BTreeSet,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

use super::{record::TimerRecord, weekday::Weekday};
use crate::error::{Result, TimerError};

/// Display color of a timer, serialized as `[r, g, b]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

impl From<[f32; 3]> for Color {
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Color> for [f32; 3] {
    fn from(color: Color) -> Self {
        [color.r, color.g, color.b]
    }
}

/// Which calendar boundary zeroes a timer's progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakKind {
    /// Fires once, `timing_secs` into the run
    Singular,
    /// Fires every `timing_secs` of the run
    Sequential,
}

/// A pause scheduled inside a timer's run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Break {
    #[serde(rename = "type")]
    pub kind: BreakKind,
    #[serde(rename = "breakTiming")]
    pub timing_secs: u64,
    #[serde(rename = "breakDuration")]
    pub duration_secs: u64,
}

impl Break {
    pub fn singular(at_secs: u64, duration_secs: u64) -> Self {
        Self {
            kind: BreakKind::Singular,
            timing_secs: at_secs,
            duration_secs,
        }
    }

    pub fn sequential(every_secs: u64, duration_secs: u64) -> Self {
        Self {
            kind: BreakKind::Sequential,
            timing_secs: every_secs,
            duration_secs,
        }
    }

    /// Whether `elapsed` falls inside one of this break's windows
    pub fn is_active_at(&self, elapsed: Duration) -> bool {
        let t = elapsed.as_secs();
        match self.kind {
            BreakKind::Singular => {
                t >= self.timing_secs && t < self.timing_secs.saturating_add(self.duration_secs)
            }
            // A zero interval would fire continuously; treat it as never.
            BreakKind::Sequential => {
                self.timing_secs > 0
                    && t >= self.timing_secs
                    && t % self.timing_secs < self.duration_secs
            }
        }
    }
}

/// Process-local identity of a timer inside one registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub(crate) u64);

/// Everything needed to create a timer
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSpec {
    pub name: String,
    pub duration: Duration,
    pub color: Color,
    pub days: BTreeSet<Weekday>,
    pub recurrence: Recurrence,
    pub breaks: Vec<Break>,
}

impl TimerSpec {
    /// A daily timer available every day, with the default color and no breaks
    pub fn new(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            duration,
            color: Color::default(),
            days: BTreeSet::new(),
            recurrence: Recurrence::Daily,
            breaks: Vec::new(),
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn days(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
        self.days = days.into_iter().collect();
        self
    }

    pub fn recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn breaks(mut self, breaks: Vec<Break>) -> Self {
        self.breaks = breaks;
        self
    }
}

/// A recurring countdown. Only the registry constructs and mutates timers.
#[derive(Debug, Clone)]
pub struct Timer {
    pub(crate) id: TimerId,
    pub(crate) name: String,
    pub(crate) duration: Duration,
    pub(crate) time_passed: Duration,
    pub(crate) color: Color,
    pub(crate) recurrence: Recurrence,
    pub(crate) days: BTreeSet<Weekday>,
    pub(crate) breaks: Vec<Break>,
    pub(crate) last_checked: Instant,
}

impl Timer {
    pub(crate) fn new(id: TimerId, spec: TimerSpec, now: Instant) -> Self {
        Self {
            id,
            name: spec.name,
            duration: spec.duration,
            time_passed: Duration::ZERO,
            color: spec.color,
            recurrence: spec.recurrence,
            days: spec.days,
            breaks: spec.breaks,
            last_checked: now,
        }
    }

    pub(crate) fn from_record(id: TimerId, record: TimerRecord, now: Instant) -> Result<Self> {
        if record.name.trim().is_empty() {
            return Err(TimerError::MalformedRecord("empty timer name".to_string()));
        }
        Ok(Self {
            id,
            name: record.name,
            duration: Duration::from_secs(record.duration),
            time_passed: Duration::from_secs(record.time_passed),
            color: record.color,
            recurrence: record.recurrence,
            days: record.days,
            breaks: record.breaks,
            last_checked: now,
        })
    }

    /// Capture the persisted fields. Elapsed time is truncated to whole seconds.
    pub fn to_record(&self) -> TimerRecord {
        TimerRecord {
            name: self.name.clone(),
            duration: self.duration.as_secs(),
            time_passed: self.time_passed.as_secs(),
            recurrence: self.recurrence,
            color: self.color,
            days: self.days.clone(),
            breaks: self.breaks.clone(),
        }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn elapsed(&self) -> Duration {
        self.time_passed
    }

    /// Time left before completion, zero once the duration is reached
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.time_passed)
    }

    /// Fraction of the duration already run, capped at 1.0
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.time_passed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn recurrence(&self) -> Recurrence {
        self.recurrence
    }

    /// Weekdays the timer may be started on; empty means every day
    pub fn days(&self) -> &BTreeSet<Weekday> {
        &self.days
    }

    pub fn breaks(&self) -> &[Break] {
        &self.breaks
    }

    pub fn is_complete(&self) -> bool {
        self.time_passed >= self.duration
    }

    pub fn is_available_on(&self, day: Weekday) -> bool {
        self.days.is_empty() || self.days.contains(&day)
    }

    /// The first break whose window contains the current elapsed time
    pub fn active_break(&self) -> Option<&Break> {
        self.breaks.iter().find(|b| b.is_active_at(self.time_passed))
    }

    /// Remaining time as `MM:SS` under an hour, `HH:MM` otherwise
    pub fn formatted_remaining(&self) -> String {
        let remaining = self
            .duration
            .as_secs()
            .saturating_sub(self.time_passed.as_secs());
        let hours = remaining / 3600;
        if hours > 0 {
            format!("{:02}:{:02}", hours, (remaining % 3600) / 60)
        } else {
            format!("{:02}:{:02}", remaining / 60, remaining % 60)
        }
    }

    pub(crate) fn accrue(&mut self, now: Instant) {
        self.time_passed = self
            .time_passed
            .saturating_add(now.saturating_duration_since(self.last_checked));
        self.last_checked = now;
    }

    pub(crate) fn reset(&mut self) {
        self.time_passed = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(duration_secs: u64, passed_secs: u64) -> Timer {
        let mut timer = Timer::new(
            TimerId(1),
            TimerSpec::new("Focus", Duration::from_secs(duration_secs)),
            Instant::now(),
        );
        timer.time_passed = Duration::from_secs(passed_secs);
        timer
    }

    #[test]
    fn formats_minutes_and_seconds_under_an_hour() {
        assert_eq!(timer(1500, 0).formatted_remaining(), "25:00");
        assert_eq!(timer(1500, 1427).formatted_remaining(), "01:13");
        assert_eq!(timer(59, 0).formatted_remaining(), "00:59");
    }

    #[test]
    fn formats_hours_and_minutes_from_an_hour_up() {
        assert_eq!(timer(3600, 0).formatted_remaining(), "01:00");
        assert_eq!(timer(2 * 3600 + 5 * 60 + 59, 0).formatted_remaining(), "02:05");
        assert_eq!(timer(12 * 3600, 0).formatted_remaining(), "12:00");
    }

    #[test]
    fn formatted_remaining_clamps_at_zero() {
        assert_eq!(timer(60, 60).formatted_remaining(), "00:00");
        assert_eq!(timer(60, 75).formatted_remaining(), "00:00");
        assert_eq!(timer(60, 75).remaining(), Duration::ZERO);
    }

    #[test]
    fn accrual_saturates_instead_of_overflowing() {
        let start = Instant::now();
        let mut timer = Timer::new(
            TimerId(1),
            TimerSpec::new("Big", Duration::from_secs(u64::MAX)),
            start,
        );
        timer.time_passed = Duration::from_secs(u64::MAX - 1);
        timer.accrue(start + Duration::from_secs(5));
        assert_eq!(timer.time_passed, Duration::MAX);
        assert!(timer.is_complete());
    }

    #[test]
    fn progress_is_fraction_of_duration() {
        assert_eq!(timer(100, 25).progress(), 0.25);
        assert_eq!(timer(100, 150).progress(), 1.0);
        assert_eq!(timer(0, 0).progress(), 1.0);
    }

    #[test]
    fn empty_days_means_every_day() {
        let every_day = timer(60, 0);
        assert!(Weekday::ALL.iter().all(|d| every_day.is_available_on(*d)));

        let mut mondays = timer(60, 0);
        mondays.days = [Weekday::Monday].into_iter().collect();
        assert!(mondays.is_available_on(Weekday::Monday));
        assert!(!mondays.is_available_on(Weekday::Tuesday));
    }

    #[test]
    fn accrue_adds_delta_and_moves_last_checked() {
        let start = Instant::now();
        let mut t = Timer::new(TimerId(1), TimerSpec::new("A", Duration::from_secs(60)), start);
        let later = start + Duration::from_millis(1500);
        t.accrue(later);
        assert_eq!(t.elapsed(), Duration::from_millis(1500));
        assert_eq!(t.last_checked, later);
    }

    #[test]
    fn singular_break_fires_once() {
        let b = Break::singular(600, 60);
        assert!(!b.is_active_at(Duration::from_secs(599)));
        assert!(b.is_active_at(Duration::from_secs(600)));
        assert!(b.is_active_at(Duration::from_secs(659)));
        assert!(!b.is_active_at(Duration::from_secs(660)));
        assert!(!b.is_active_at(Duration::from_secs(1200)));
    }

    #[test]
    fn sequential_break_repeats() {
        let b = Break::sequential(600, 60);
        assert!(!b.is_active_at(Duration::from_secs(30)));
        assert!(b.is_active_at(Duration::from_secs(610)));
        assert!(!b.is_active_at(Duration::from_secs(700)));
        assert!(b.is_active_at(Duration::from_secs(1230)));
        assert!(!Break::sequential(0, 60).is_active_at(Duration::from_secs(10)));
    }

    #[test]
    fn active_break_follows_elapsed_time() {
        let mut t = timer(3600, 0);
        t.breaks = vec![Break::singular(600, 60), Break::sequential(1500, 300)];
        assert_eq!(t.active_break(), None);
        t.time_passed = Duration::from_secs(620);
        assert_eq!(t.active_break(), Some(&Break::singular(600, 60)));
        t.time_passed = Duration::from_secs(3100);
        assert_eq!(t.active_break(), Some(&Break::sequential(1500, 300)));
    }
}
