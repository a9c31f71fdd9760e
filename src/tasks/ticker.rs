//! Registry tick background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::{AppState, Tick};

/// Background task that advances the registry once per tick.
///
/// Accrues elapsed time for the running timer and, while idle, applies
/// day and week rollovers.
pub async fn ticker_task(state: Arc<AppState>, period: Duration) {
    info!("Starting timer tick task (every {}ms)", period.as_millis());

    let mut interval = interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        match state.tick() {
            Ok(Tick::Completed { name }) => {
                debug!("Tick completed timer '{}'", name);
            }
            Ok(Tick::Idle {
                rollover: Some(rollover),
            }) => {
                debug!("Tick applied {:?} rollover", rollover);
            }
            Ok(_) => {}
            Err(e) => {
                error!("Failed to update timers: {}", e);
                // Wait a bit before retrying
                sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
