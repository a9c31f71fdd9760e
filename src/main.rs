//! Timerwise - recurring daily and weekly productivity timers
//!
//! This is the main entry point for the timerwise daemon.

use std::sync::Arc;
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use timerwise::{
    api::create_router,
    config::Config,
    persistence::StateStore,
    state::{AppState, Timers},
    tasks::{autosave_task, ticker_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("timerwise={},tower_http=info", config.log_level()))
        .init();

    info!("Starting timerwise v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, data_dir={}, tick={}ms",
        config.host,
        config.port,
        config.data_dir.display(),
        config.tick_ms
    );

    // Restore saved timers; a rollover missed while stopped is applied here.
    // A corrupt timer file stops startup instead of being overwritten.
    let store = StateStore::new(&config.data_dir);
    let state = Arc::new(AppState::new(
        Timers::with_system_clock(),
        store,
        config.port,
        config.host.clone(),
    ));
    state
        .restore()
        .with_context(|| format!("failed to load {}", state.store.timers_path().display()))?;

    // Start the background tasks
    let ticker_state = Arc::clone(&state);
    let tick_interval = config.tick_interval();
    tokio::spawn(async move {
        ticker_task(ticker_state, tick_interval).await;
    });

    let autosave_state = Arc::clone(&state);
    let autosave_interval = config.autosave_interval();
    tokio::spawn(async move {
        autosave_task(autosave_state, autosave_interval).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET    /timers            - List timers (?include_active=&days=Today,Monday)");
    info!("  POST   /timers            - Create a timer");
    info!("  PATCH  /timers/:name      - Edit a timer");
    info!("  DELETE /timers/:name      - Remove a timer");
    info!("  POST   /timers/:name/start - Start a timer");
    info!("  POST   /timers/:name/reset - Reset a timer's progress");
    info!("  POST   /stop              - Stop the running timer");
    info!("  GET    /active            - Running timer");
    info!("  GET    /status            - Registry status");
    info!("  GET    /health            - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    // Flush the running timer's last tick before the final save
    if let Err(e) = state.tick() {
        tracing::error!("Failed to update timers before shutdown: {}", e);
    }
    state
        .save()
        .with_context(|| format!("failed to save {}", state.store.timers_path().display()))?;
    info!("Saved timers to {}", state.store.timers_path().display());

    info!("Server shutdown complete");
    Ok(())
}
