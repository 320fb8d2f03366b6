//! Workout timer - drift-corrected countdown daemon
//!
//! This is the main entry point for the workout-timer application.

use std::sync::Arc;

use tokio::{net::TcpListener, sync::mpsc};
use tracing::{info, warn};

use workout_timer::{
    api::create_router,
    config::Config,
    services::{check_command_available, Notifier, NotificationPermission, SoundPlayer},
    state::{AppState, DeviceSync, TimerController},
    tasks::{
        completion_alert_task, report_listener_task, spawn_timer_engine, sync_poll_task,
        CompletionAlert,
    },
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("workout_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting workout-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, duration={}s",
        config.host, config.port, config.duration
    );

    // Side-effect helpers are optional: warn and keep going without them
    if config.sound.is_some() {
        if let Err(e) = check_command_available(&config.sound_player).await {
            warn!("{}; completion sound will be skipped", e);
        }
    }
    if config.notifications == NotificationPermission::Granted {
        if let Err(e) = check_command_available(&config.notifier).await {
            warn!("{}; notifications will be skipped", e);
        }
    }

    // Engine task and the controller that drives it
    let (command_tx, report_rx) = spawn_timer_engine();
    let (alert_tx, alert_rx) = mpsc::unbounded_channel();
    let timer = Arc::new(TimerController::new(command_tx, move || {
        if alert_tx.send(CompletionAlert::now()).is_err() {
            warn!("Completion alert task is gone, alert dropped");
        }
    }));

    let sync = if config.no_sync {
        info!("Cross-device sync disabled");
        None
    } else {
        let store = config.sync_store();
        let device_id = config.device_id();
        info!(
            "Cross-device sync: device={}, store={}",
            device_id,
            store.dir().display()
        );
        Some(DeviceSync::new(device_id, config.user(), store))
    };

    // Create application state
    let state = Arc::new(AppState::new(
        Arc::clone(&timer),
        sync,
        config.duration,
        config.port,
        config.host.clone(),
    ));
    timer.reset_timer_to_duration(config.duration)?;

    tokio::spawn(report_listener_task(Arc::clone(&timer), report_rx));
    tokio::spawn(completion_alert_task(
        Arc::clone(&state),
        alert_rx,
        SoundPlayer::new(config.sound_player.clone(), config.sound.clone()),
        Notifier::new(config.notifications, config.notifier.clone()),
    ));
    tokio::spawn(sync_poll_task(Arc::clone(&state), config.poll_interval()));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/start    - Start a countdown {{\"duration\": secs}}");
    info!("  POST /timer/stop     - Stop the countdown");
    info!("  POST /timer/pause    - Pause the countdown");
    info!("  POST /timer/resume   - Resume the countdown");
    info!("  POST /timer/reset    - Reset the idle timer {{\"duration\": secs}}");
    info!("  POST /sync/takeover  - Drive the shared countdown from this device");
    info!("  GET  /status         - Timer, engine and sync status");
    info!("  GET  /health         - Health check");

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

    info!("Server shutdown complete");
    Ok(())
}
