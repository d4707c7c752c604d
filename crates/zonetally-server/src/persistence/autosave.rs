//! Periodic background save.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::PersistenceManager;

/// Stop hook for a running autosave loop.
///
/// Dropping the handle detaches the loop; it then runs until the runtime shuts
/// down. Only tests and the shutdown path call [`AutosaveHandle::stop`].
pub struct AutosaveHandle {
    stop: Arc<Notify>,
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    pub(super) fn spawn(manager: Arc<PersistenceManager>, interval: Duration) -> Self {
        let stop = Arc::new(Notify::new());
        let task = tokio::spawn(run(manager, interval, Arc::clone(&stop)));
        Self { stop, task }
    }

    /// Ask the loop to exit and wait for it. A save already in flight completes first.
    pub async fn stop(self) {
        // notify_one stores a permit, so a loop busy saving still sees it.
        self.stop.notify_one();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "autosave task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn run(manager: Arc<PersistenceManager>, interval: Duration, stop: Arc<Notify>) {
    tracing::info!(interval_ms = interval.as_millis() as u64, "autosave started");
    loop {
        tokio::select! {
            _ = stop.notified() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let m = Arc::clone(&manager);
        if let Err(e) = tokio::task::spawn_blocking(move || m.save()).await {
            tracing::warn!(error = %e, "autosave tick panicked");
        }
    }
    tracing::info!("autosave stopped");
}
