//! Field Timer - a control panel server for competition countdown timers
//!
//! This is the main entry point for the field-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use field_timer::{
    config::Config,
    services::{SoundPlayer, Switchboard},
    state::AppState,
    api::create_router,
    timer::SoundTrigger,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("field_timer={},tower_http=info", config.log_level()))
        .init();

    let settings = config.timer_settings();
    info!("Starting field-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, serial={}, match={}ms, skills={}ms",
          config.host, config.port, config.serial.display(), settings.match_ms, settings.skills_ms);

    if !config.serial.exists() {
        warn!("Serial device {} not present yet; pair once it is plugged in", config.serial.display());
    }

    for cue in [&config.warning_sound, &config.complete_sound] {
        if !cue.exists() {
            warn!("Cue file {} not found; that cue will be skipped", cue.display());
        }
    }
    let sounds: Arc<dyn SoundTrigger> = Arc::new(SoundPlayer::new(
        config.warning_sound.clone(),
        config.complete_sound.clone(),
        config.volume,
    ));

    // Create application state
    let switchboard = Arc::new(Switchboard::new(config.serial.clone()));
    let state = Arc::new(AppState::new(
        settings,
        switchboard,
        Some(sounds),
        config.port,
        config.host.clone(),
    ));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /view/:name               - Show control, match or skills");
    info!("  POST /timer/toggle             - Start, pause or resume the timer");
    info!("  POST /timer/reset              - Reset the timer");
    info!("  POST /visibility               - Report page visibility");
    info!("  POST /serial/pair              - Pair the serial device");
    info!("  POST /control/pin/:pin/toggle  - Flip enable (0) or mode (1)");
    info!("  GET  /status                   - Panel, timer and serial status");
    info!("  GET  /health                   - Health check");

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

    state.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}
