//! Autosave background task

use std::{sync::Arc, time::Duration};
use tokio::{sync::broadcast::error::RecvError, time::interval};
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// Background task that saves the registry after every change and on a
/// fixed period, so progress survives a crash between changes
pub async fn autosave_task(state: Arc<AppState>, period: Duration) {
    info!("Starting autosave task (every {}s)", period.as_secs());

    let mut changes = state.subscribe();
    let mut interval = interval(period);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                persist(&state, "periodic");
            }

            event = changes.recv() => match event {
                Ok(event) => {
                    debug!("Saving after {:?}", event);
                    persist(&state, event.action());
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Autosave missed {} change notifications", skipped);
                    persist(&state, "lagged");
                }
                Err(RecvError::Closed) => {
                    info!("Change channel closed, stopping autosave task");
                    break;
                }
            },
        }
    }
}

fn persist(state: &AppState, reason: &str) {
    match state.save() {
        Ok(()) => debug!("Autosave ({}) complete", reason),
        Err(e) => error!("Autosave ({}) failed: {}", reason, e),
    }
}
