//! Timer registry: ownership, the active timer, accrual and calendar rollover

use std::{
    collections::BTreeSet,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::{
    clock::{CalendarMarker, Clock, SystemClock},
    error::{Result, TimerError},
    timer::{Break, Color, DayFilter, Recurrence, Timer, TimerId, TimerRecord, TimerSpec, Weekday},
};

/// Which boundary a calendar check crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollover {
    /// New day in the same week: daily timers were reset
    Daily,
    /// New week: every timer was reset
    Weekly,
}

/// Outcome of one [`Timers::update`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Nothing was running; the calendar was checked instead
    Idle { rollover: Option<Rollover> },
    /// The active timer accrued time and is still running
    Running,
    /// The active timer reached its duration and was stopped
    Completed { name: String },
}

/// Everything needed to restore a registry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedState {
    pub timers: Vec<TimerRecord>,
    pub markers: Option<CalendarMarker>,
}

/// In-place edit of a timer; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimerUpdate {
    pub name: Option<String>,
    pub duration: Option<Duration>,
    pub color: Option<Color>,
    pub days: Option<BTreeSet<Weekday>>,
    pub recurrence: Option<Recurrence>,
    pub breaks: Option<Vec<Break>>,
}

/// Owns every timer and tracks which one, if any, is running.
///
/// The registry assumes exclusive access per call. Hosts that share it
/// across threads put it behind a mutex (see [`crate::state::AppState`]).
#[derive(Debug)]
pub struct Timers {
    timers: Vec<Timer>,
    active: Option<TimerId>,
    markers: Option<CalendarMarker>,
    next_id: u64,
    clock: Arc<dyn Clock>,
}

impl Timers {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            timers: Vec::new(),
            active: None,
            markers: None,
            next_id: 0,
            clock,
        }
    }

    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    fn allocate_id(&mut self) -> TimerId {
        self.next_id += 1;
        TimerId(self.next_id)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.timers.iter().position(|t| t.name == name)
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| TimerError::NotFound(name.to_string()))
    }

    fn active_index(&self) -> Option<usize> {
        let id = self.active?;
        self.timers.iter().position(|t| t.id == id)
    }

    fn validate_name<'a>(&self, name: &'a str, current: Option<usize>) -> Result<&'a str> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TimerError::EmptyName);
        }
        match self.position(name) {
            Some(index) if Some(index) != current => Err(TimerError::DuplicateName(name.to_string())),
            _ => Ok(name),
        }
    }

    /// Create and append a timer. Names are trimmed and must be unique.
    pub fn new_timer(&mut self, spec: TimerSpec) -> Result<()> {
        let name = match self.validate_name(&spec.name, None) {
            Ok(name) => name.to_string(),
            Err(e) => {
                warn!("Refusing to create timer: {}", e);
                return Err(e);
            }
        };
        let id = self.allocate_id();
        let now = self.clock.instant();
        info!(
            "Created {:?} timer '{}' ({}s)",
            spec.recurrence,
            name,
            spec.duration.as_secs()
        );
        self.timers.push(Timer::new(id, TimerSpec { name, ..spec }, now));
        Ok(())
    }

    /// Make `name` the active timer, replacing any running one.
    ///
    /// Refused with `UnavailableToday` when the timer is restricted to other
    /// weekdays; the registry is left untouched in that case.
    pub fn start_timer(&mut self, name: &str) -> Result<()> {
        let index = self.require(name)?;
        let today = self.clock.weekday();
        if !self.timers[index].is_available_on(today) {
            info!("Timer '{}' is not scheduled for {}, not starting", name, today);
            return Err(TimerError::UnavailableToday {
                name: name.to_string(),
                today,
            });
        }

        let now = self.clock.instant();
        self.flush_active(now);
        let timer = &mut self.timers[index];
        timer.last_checked = now;
        self.active = Some(timer.id);
        info!("Started timer '{}' ({} remaining)", name, timer.formatted_remaining());
        Ok(())
    }

    /// Stop the running timer, keeping its progress. Returns whether one was running.
    pub fn stop_timer(&mut self) -> bool {
        let now = self.clock.instant();
        self.flush_active(now);
        match self.active.take() {
            Some(id) => {
                if let Some(timer) = self.timers.iter().find(|t| t.id == id) {
                    info!("Stopped timer '{}' at {}s", timer.name, timer.time_passed.as_secs());
                }
                true
            }
            None => false,
        }
    }

    fn flush_active(&mut self, now: Instant) {
        if let Some(index) = self.active_index() {
            self.timers[index].accrue(now);
        }
    }

    /// Advance the registry to the clock's current instant
    pub fn update(&mut self) -> Tick {
        let now = self.clock.instant();
        self.update_at(now)
    }

    /// Accrue elapsed time for the active timer up to `now`, or run the
    /// calendar check when idle. Overshoot past the duration is kept.
    pub fn update_at(&mut self, now: Instant) -> Tick {
        let Some(index) = self.active_index() else {
            self.active = None;
            return Tick::Idle {
                rollover: self.check_time(),
            };
        };

        let timer = &mut self.timers[index];
        timer.accrue(now);
        if !timer.is_complete() {
            return Tick::Running;
        }

        let name = timer.name.clone();
        info!(
            "Timer '{}' completed after {}s",
            name,
            timer.time_passed.as_secs()
        );
        self.active = None;
        Tick::Completed { name }
    }

    /// Compare today's calendar position with the last one seen
    pub fn check_time(&mut self) -> Option<Rollover> {
        let today = self.clock.today();
        self.check_time_at(today)
    }

    /// Reset progress if `date` is a different day than the stored marker:
    /// every timer on a new week, daily timers only on a new day. The first
    /// check of a registry without markers only records them.
    pub fn check_time_at(&mut self, date: NaiveDate) -> Option<Rollover> {
        let current = CalendarMarker::from_date(date);
        let Some(previous) = self.markers else {
            debug!("Recording initial calendar marker {}", current);
            self.markers = Some(current);
            return None;
        };
        if previous.day == current.day {
            return None;
        }

        let rollover = if previous.week != current.week {
            Rollover::Weekly
        } else {
            Rollover::Daily
        };
        let reset = match rollover {
            Rollover::Weekly => self.reset_all(None),
            Rollover::Daily => self.reset_all(Some(Recurrence::Daily)),
        };
        self.markers = Some(current);
        info!(
            "{:?} rollover ({} -> {}), reset {} timers",
            rollover, previous, current, reset
        );
        Some(rollover)
    }

    /// Zero every timer, or only those of one recurrence kind. Returns how many.
    pub fn reset_all(&mut self, kind: Option<Recurrence>) -> usize {
        let mut count = 0;
        for timer in &mut self.timers {
            if kind.map_or(true, |k| timer.recurrence == k) {
                timer.reset();
                count += 1;
            }
        }
        count
    }

    /// Zero one timer's progress. Does not change whether it is running.
    pub fn reset_timer(&mut self, name: &str) -> Result<()> {
        let index = self.require(name)?;
        let now = self.clock.instant();
        let timer = &mut self.timers[index];
        timer.reset();
        timer.last_checked = now;
        info!("Reset timer '{}'", name);
        Ok(())
    }

    /// Remove a timer, clearing the active slot if it was running
    pub fn remove_timer(&mut self, name: &str) -> Result<Timer> {
        let index = self.require(name)?;
        let timer = self.timers.remove(index);
        if self.active == Some(timer.id) {
            self.active = None;
            info!("Removed active timer '{}'", timer.name);
        } else {
            info!("Removed timer '{}'", timer.name);
        }
        Ok(timer)
    }

    /// Apply an in-place edit. A running timer keeps running.
    pub fn edit_timer(&mut self, name: &str, update: TimerUpdate) -> Result<()> {
        let index = self.require(name)?;
        let new_name = match &update.name {
            Some(new_name) => Some(self.validate_name(new_name, Some(index))?.to_string()),
            None => None,
        };

        let timer = &mut self.timers[index];
        if let Some(new_name) = new_name {
            timer.name = new_name;
        }
        if let Some(duration) = update.duration {
            timer.duration = duration;
        }
        if let Some(color) = update.color {
            timer.color = color;
        }
        if let Some(days) = update.days {
            timer.days = days;
        }
        if let Some(recurrence) = update.recurrence {
            timer.recurrence = recurrence;
        }
        if let Some(breaks) = update.breaks {
            timer.breaks = breaks;
        }
        info!("Edited timer '{}'", timer.name);
        Ok(())
    }

    pub fn active_timer(&self) -> Option<&Timer> {
        self.active_index().map(|index| &self.timers[index])
    }

    /// All timers in insertion order
    pub fn timers(&self) -> &[Timer] {
        &self.timers
    }

    pub fn get(&self, name: &str) -> Option<&Timer> {
        self.position(name).map(|index| &self.timers[index])
    }

    pub fn markers(&self) -> Option<CalendarMarker> {
        self.markers
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Timers matching a query, in insertion order.
    ///
    /// With `include_active` false the running timer is left out. A non-empty
    /// `filter` keeps timers available every day plus those sharing at least
    /// one weekday with it; `DayFilter::Today` stands for the current weekday.
    pub fn filtered(&self, include_active: bool, filter: &[DayFilter]) -> Vec<&Timer> {
        if include_active && filter.is_empty() {
            return self.timers.iter().collect();
        }

        let today = self.clock.weekday();
        let wanted: BTreeSet<Weekday> = filter.iter().map(|f| f.resolve(today)).collect();
        let active = self.active_timer().map(|t| t.id);

        self.timers
            .iter()
            .filter(|t| include_active || Some(t.id) != active)
            .filter(|t| filter.is_empty() || t.days.is_empty() || !t.days.is_disjoint(&wanted))
            .collect()
    }

    /// Replace the registry contents with a saved state, then apply any
    /// rollover that happened while nothing was running. Records with empty
    /// or duplicate names are skipped. Returns how many timers were restored.
    ///
    /// Without saved markers nothing is reset: restored progress is kept and
    /// today's markers are recorded as the starting point.
    pub fn load_state(&mut self, saved: SavedState) -> usize {
        self.timers.clear();
        self.active = None;
        self.markers = saved.markers;

        let now = self.clock.instant();
        for record in saved.timers {
            if self.position(&record.name).is_some() {
                warn!("Skipping duplicate timer record '{}'", record.name);
                continue;
            }
            let id = self.allocate_id();
            match Timer::from_record(id, record, now) {
                Ok(timer) => self.timers.push(timer),
                Err(e) => warn!("Skipping timer record: {}", e),
            }
        }

        let restored = self.timers.len();
        info!("Restored {} timers", restored);
        if let Some(rollover) = self.check_time() {
            info!("Applied {:?} reset missed while not running", rollover);
        }
        restored
    }

    /// Capture every timer and the calendar marker
    pub fn save_state(&self) -> SavedState {
        SavedState {
            timers: self.timers.iter().map(Timer::to_record).collect(),
            markers: self.markers,
        }
    }
}
