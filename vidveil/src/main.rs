//! vidveil: privacy-preserving meta-search aggregator.

use tracing::info;
use vidveil::api::{ApiServer, AppState};
use vidveil::config::AppConfig;
use vidveil::logging::init_logging;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_dir = std::env::var("VIDVEIL_LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let _guard = init_logging(&log_dir)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting vidveil v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::from_env_or_default();
    let state = AppState::from_config(config)?;
    info!(engines = state.registry.len(), "Engine registry ready");

    let server = ApiServer::new(state);
    let cancel_token = server.cancel_token();

    let server_task = tokio::spawn(async move { server.run().await });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), initiating shutdown...");
        }
        _ = wait_for_sigterm() => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cancel_token.cancel();
    if let Err(e) = server_task.await? {
        tracing::error!("Server exited with error: {}", e);
    }

    info!("vidveil shutdown complete");
    Ok(())
}

/// Wait for SIGTERM signal (Unix only).
#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
    sigterm.recv().await;
}

/// Wait for SIGTERM signal (non-Unix: never resolves; Ctrl+C covers it).
#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await;
}
