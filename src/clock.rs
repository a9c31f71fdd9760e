//! Time sources
//!
//! Elapsed time is accrued from a monotonic [`Instant`]; day and week
//! boundaries are computed from the local calendar date. The two never mix.

use std::{
    fmt,
    str::FromStr,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};

use crate::{error::TimerError, timer::Weekday};

/// Supplies "now" in both time domains
pub trait Clock: Send + Sync + fmt::Debug {
    /// Monotonic time, used for accrual
    fn instant(&self) -> Instant;

    /// Local wall-clock time, used for calendar boundaries
    fn local_now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.local_now().date()
    }

    fn weekday(&self) -> Weekday {
        Weekday::from(self.today().weekday())
    }
}

/// The process clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn instant(&self) -> Instant {
        Instant::now()
    }

    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to. Handy for tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    inner: Mutex<ManualTime>,
}

#[derive(Debug, Clone, Copy)]
struct ManualTime {
    instant: Instant,
    local: NaiveDateTime,
}

impl ManualClock {
    pub fn new(local: NaiveDateTime) -> Self {
        Self {
            inner: Mutex::new(ManualTime {
                instant: Instant::now(),
                local,
            }),
        }
    }

    /// Move both time domains forward together
    pub fn advance(&self, by: Duration) {
        let mut time = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        time.instant += by;
        if let Some(local) = chrono::Duration::from_std(by)
            .ok()
            .and_then(|delta| time.local.checked_add_signed(delta))
        {
            time.local = local;
        }
    }

    /// Jump the calendar without touching monotonic time, like a wall-clock
    /// adjustment or a machine waking up on another day
    pub fn set_local(&self, local: NaiveDateTime) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .local = local;
    }
}

impl Clock for ManualClock {
    fn instant(&self) -> Instant {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).instant
    }

    fn local_now(&self) -> NaiveDateTime {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).local
    }
}

/// Last observed calendar position: day of year (Jan 1 = 0) and
/// Monday-start week of year (days before the first Monday are week 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarMarker {
    pub day: u32,
    pub week: u32,
}

impl CalendarMarker {
    pub fn new(day: u32, week: u32) -> Self {
        Self { day, week }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        let day = date.ordinal0();
        let week = (day + 7 - date.weekday().num_days_from_monday()) / 7;
        Self { day, week }
    }
}

/// Written as `"<day> <week>"`
impl fmt::Display for CalendarMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day, self.week)
    }
}

impl FromStr for CalendarMarker {
    type Err = TimerError;

    /// A lone day is accepted with week 0
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split_whitespace();
        let parse = |field: Option<&str>, what: &str| -> Result<Option<u32>, TimerError> {
            field
                .map(|f| {
                    f.parse::<u32>().map_err(|e| {
                        TimerError::MalformedRecord(format!("invalid {} marker '{}': {}", what, f, e))
                    })
                })
                .transpose()
        };
        let day = parse(fields.next(), "day")?
            .ok_or_else(|| TimerError::MalformedRecord("empty calendar marker".to_string()))?;
        let week = parse(fields.next(), "week")?.unwrap_or(0);
        Ok(Self { day, week })
    }
}
