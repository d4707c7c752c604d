//! zonetally server
//!
//! - Status page: /  (starts the detector on first view)
//! - Read API:    /api/zone_counters
//! - Snapshot file loaded on start, saved every interval and once on shutdown

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use zonetally_core::error::Result;
use zonetally_server::activation::IdleDetector;
use zonetally_server::{app_state::AppState, config, serve};

const CONFIG_ENV: &str = "ZONETALLY_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "zonetally.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.code(), error = %e, "zonetally-server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::load_or_default(&cfg_path)?;
    let listen = cfg.server.listen_addr()?;

    let state = AppState::new(&cfg.persistence, Arc::new(IdleDetector::new()));
    tracing::info!(%listen, "zonetally-server starting");
    serve::run(state, listen, shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
