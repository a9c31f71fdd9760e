//! Main application state management

use std::{
    sync::{Mutex, MutexGuard},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use super::{ActiveTimer, Tick, TimerEvent, TimerUpdate, Timers};
use crate::{
    error::{Result, TimerError},
    persistence::StateStore,
    timer::TimerSpec,
};

/// Shared state of the daemon: the registry behind a mutex plus the
/// channels the background tasks and handlers listen on
#[derive(Debug)]
pub struct AppState {
    /// The timer registry; every call holds the lock for one operation
    timers: Mutex<Timers>,
    /// Where the registry is saved
    pub store: StateStore,
    /// Held from snapshot to rename so saves land in order
    save_lock: Mutex<()>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
    /// Channel for change notifications
    pub change_tx: broadcast::Sender<TimerEvent>,
    /// Channel carrying the running timer after every tick and change
    pub active_tx: watch::Sender<Option<ActiveTimer>>,
    /// Keep the receiver alive to prevent channel closure
    pub _active_rx: watch::Receiver<Option<ActiveTimer>>,
}

impl AppState {
    /// Wrap an already loaded registry
    pub fn new(timers: Timers, store: StateStore, port: u16, host: String) -> Self {
        let (change_tx, _) = broadcast::channel(100);
        let (active_tx, active_rx) = watch::channel(ActiveTimer::of(&timers));

        Self {
            timers: Mutex::new(timers),
            store,
            save_lock: Mutex::new(()),
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            change_tx,
            active_tx,
            _active_rx: active_rx,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Timers>> {
        self.timers
            .lock()
            .map_err(|e| TimerError::Lock(e.to_string()))
    }

    /// Read from the registry without notifying anyone
    pub fn read_timers<T, F>(&self, reader: F) -> Result<T>
    where
        F: FnOnce(&Timers) -> T,
    {
        let timers = self.lock()?;
        Ok(reader(&timers))
    }

    /// Apply a change to the registry, then record it and notify listeners
    pub fn update_timers<T, F>(&self, updater: F) -> Result<T>
    where
        F: FnOnce(&mut Timers) -> Result<(T, TimerEvent)>,
    {
        let mut timers = self.lock()?;
        let (value, event) = updater(&mut timers)?;
        let active = ActiveTimer::of(&timers);
        drop(timers); // Release the lock early

        self.publish(event, active);
        Ok(value)
    }

    fn publish(&self, event: TimerEvent, active: Option<ActiveTimer>) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(event.action().to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }

        self.active_tx.send_replace(active);

        // No subscribers is normal before the autosave task starts
        if let Err(e) = self.change_tx.send(event) {
            debug!("No listeners for timer event: {}", e);
        }
    }

    pub fn create_timer(&self, spec: TimerSpec) -> Result<()> {
        let name = spec.name.trim().to_string();
        self.update_timers(|timers| {
            timers.new_timer(spec)?;
            Ok(((), TimerEvent::Created { name }))
        })
    }

    pub fn start_timer(&self, name: &str) -> Result<()> {
        self.update_timers(|timers| {
            timers.start_timer(name)?;
            Ok(((), TimerEvent::Started { name: name.to_string() }))
        })
    }

    /// Returns whether a timer was running
    pub fn stop_timer(&self) -> Result<bool> {
        self.update_timers(|timers| Ok((timers.stop_timer(), TimerEvent::Stopped)))
    }

    pub fn remove_timer(&self, name: &str) -> Result<()> {
        self.update_timers(|timers| {
            timers.remove_timer(name)?;
            Ok(((), TimerEvent::Removed { name: name.to_string() }))
        })
    }

    pub fn edit_timer(&self, name: &str, update: TimerUpdate) -> Result<()> {
        let new_name = update
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(name)
            .to_string();
        self.update_timers(|timers| {
            timers.edit_timer(name, update)?;
            Ok(((), TimerEvent::Edited { name: new_name }))
        })
    }

    pub fn reset_timer(&self, name: &str) -> Result<()> {
        self.update_timers(|timers| {
            timers.reset_timer(name)?;
            Ok(((), TimerEvent::Reset { name: name.to_string() }))
        })
    }

    /// Drive the registry one step and publish what happened
    pub fn tick(&self) -> Result<Tick> {
        let mut timers = self.lock()?;
        let tick = timers.update();
        let active = ActiveTimer::of(&timers);
        drop(timers);

        match &tick {
            Tick::Completed { name } => {
                self.publish(TimerEvent::Completed { name: name.clone() }, active)
            }
            Tick::Idle {
                rollover: Some(rollover),
            } => self.publish(TimerEvent::rolled_over(*rollover), active),
            _ => {
                self.active_tx.send_replace(active);
            }
        }
        Ok(tick)
    }

    /// Persist the registry through the store
    pub fn save(&self) -> Result<()> {
        let _guard = self
            .save_lock
            .lock()
            .map_err(|e| TimerError::Lock(e.to_string()))?;
        let saved = self.read_timers(Timers::save_state)?;
        self.store.save(&saved)?;
        debug!("Saved {} timers", saved.timers.len());
        Ok(())
    }

    /// Current running timer as last published
    pub fn active_timer(&self) -> Option<ActiveTimer> {
        self.active_tx.borrow().clone()
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.change_tx.subscribe()
    }

    /// Watch the running timer
    pub fn watch_active(&self) -> watch::Receiver<Option<ActiveTimer>> {
        self.active_tx.subscribe()
    }

    /// Time since the daemon started, e.g. `1d 2h 5m` or `42s`
    pub fn get_uptime(&self) -> String {
        format_uptime(self.start_time.elapsed())
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Load the store into the registry, replacing its contents
    pub fn restore(&self) -> Result<usize> {
        let saved = self.store.load()?;
        let restored = self.update_timers(|timers| {
            let restored = timers.load_state(saved);
            Ok((restored, TimerEvent::Restored { count: restored }))
        })?;
        info!("Loaded {} timers from {}", restored, self.store.timers_path().display());
        Ok(restored)
    }
}

/// Largest two non-zero units, down to seconds
fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let units = [
        (secs / 86_400, "d"),
        ((secs % 86_400) / 3600, "h"),
        ((secs % 3600) / 60, "m"),
        (secs % 60, "s"),
    ];
    let parts: Vec<String> = units
        .iter()
        .skip_while(|(value, _)| *value == 0)
        .take(2)
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect();
    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, timer::Weekday};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn app(clock: Arc<ManualClock>, dir: &std::path::Path) -> AppState {
        AppState::new(
            Timers::new(clock),
            StateStore::new(dir),
            20554,
            "127.0.0.1".to_string(),
        )
    }

    fn monday() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        ))
    }

    #[tokio::test]
    async fn changes_are_broadcast_and_recorded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = app(monday(), dir.path());
        let mut events = state.subscribe();

        state
            .create_timer(TimerSpec::new(" Focus ", Duration::from_secs(60)))
            .unwrap();
        state.start_timer("Focus").unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            TimerEvent::Created { name: "Focus".to_string() }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            TimerEvent::Started { name: "Focus".to_string() }
        );
        assert_eq!(state.get_last_action().0.as_deref(), Some("start"));
        assert_eq!(state.active_timer().unwrap().name, "Focus");
    }

    #[tokio::test]
    async fn failed_changes_are_not_broadcast() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = app(monday(), dir.path());
        let mut events = state.subscribe();

        state
            .create_timer(TimerSpec::new("Weekend", Duration::from_secs(60)).days([Weekday::Saturday]))
            .unwrap();
        events.recv().await.unwrap();

        assert!(matches!(
            state.start_timer("Weekend"),
            Err(TimerError::UnavailableToday { .. })
        ));
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
        assert_eq!(state.active_timer(), None);
    }

    #[test]
    fn tick_publishes_completion() {
        let dir = tempfile::tempdir().expect("tempdir");
        let clock = monday();
        let state = app(clock.clone(), dir.path());
        let mut events = state.subscribe();
        state
            .create_timer(TimerSpec::new("Quick", Duration::from_secs(5)))
            .unwrap();
        state.start_timer("Quick").unwrap();

        clock.advance(Duration::from_secs(2));
        assert_eq!(state.tick().unwrap(), Tick::Running);
        assert_eq!(state.active_timer().unwrap().elapsed_seconds, 2);

        clock.advance(Duration::from_secs(3));
        assert_eq!(
            state.tick().unwrap(),
            Tick::Completed { name: "Quick".to_string() }
        );
        assert_eq!(state.active_timer(), None);

        let received: Vec<TimerEvent> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        assert_eq!(
            received.last(),
            Some(&TimerEvent::Completed { name: "Quick".to_string() })
        );
    }

    #[test]
    fn save_and_restore_through_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let clock = monday();
        let state = app(clock.clone(), dir.path());
        state
            .create_timer(TimerSpec::new("Focus", Duration::from_secs(600)))
            .unwrap();
        state.start_timer("Focus").unwrap();
        clock.advance(Duration::from_secs(120));
        state.tick().unwrap();
        state.tick().unwrap();
        state.save().unwrap();

        let reopened = app(clock, dir.path());
        assert_eq!(reopened.restore().unwrap(), 1);
        let elapsed = reopened
            .read_timers(|t| t.get("Focus").map(|t| t.elapsed()))
            .unwrap();
        assert_eq!(elapsed, Some(Duration::from_secs(120)));
        assert_eq!(reopened.active_timer(), None);
    }

    #[test]
    fn concurrent_saves_keep_the_latest_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = app(monday(), dir.path());

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let state = &state;
                scope.spawn(move || {
                    for n in 0..25 {
                        state
                            .create_timer(TimerSpec::new(
                                format!("T{}-{}", worker, n),
                                Duration::from_secs(60),
                            ))
                            .unwrap();
                        state.save().unwrap();
                    }
                });
            }
        });

        let saved = state.store.load().unwrap();
        assert_eq!(saved.timers.len(), 100);
    }

    #[test]
    fn uptime_shows_two_largest_units() {
        assert_eq!(format_uptime(Duration::ZERO), "0s");
        assert_eq!(format_uptime(Duration::from_secs(42)), "42s");
        assert_eq!(format_uptime(Duration::from_secs(3 * 60 + 7)), "3m 7s");
        assert_eq!(format_uptime(Duration::from_secs(2 * 3600 + 59)), "2h");
        assert_eq!(
            format_uptime(Duration::from_secs(86_400 + 2 * 3600 + 5 * 60)),
            "1d 2h"
        );
    }
}
