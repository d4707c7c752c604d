//! Process lifecycle: load, autosave, serve, final flush.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use zonetally_core::error::{Result, ZoneTallyError};

use crate::{app_state::AppState, router};

/// Run the server until `shutdown` resolves.
///
/// The shutdown flush runs on every exit path, including a failed bind, so
/// counts written into the map before the listener came up are not lost.
pub async fn run<F>(state: AppState, listen: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let persistence = state.persistence();
    persistence.load_on_start();
    let autosave = persistence.start_autosave();

    let served = serve(state, listen, shutdown).await;

    if let Some(handle) = autosave {
        handle.stop().await;
    }
    let p = Arc::clone(&persistence);
    if let Err(e) = tokio::task::spawn_blocking(move || p.shutdown_flush()).await {
        tracing::warn!(error = %e, "shutdown flush panicked");
    }

    served
}

async fn serve<F>(state: AppState, listen: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| ZoneTallyError::Io(format!("bind {listen} failed: {e}")))?;
    tracing::info!(
        %listen,
        snapshot = %state.persistence().path().display(),
        "zonetally-server listening"
    );

    let app = router::build_router(state.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            state.set_draining();
        })
        .await
        .map_err(|e| ZoneTallyError::Internal(format!("server failed: {e}")))
}
