use async_trait::async_trait;

use zonetally_core::error::Result;
use zonetally_core::CounterMap;

/// The subsystem that produces counts.
///
/// `start` is awaited inside the first page request, so implementations
/// should spawn their long-running work and return promptly. All writes must
/// go through `counters.lock()` / `counters.update()`.
#[async_trait]
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;
    async fn start(&self, counters: CounterMap) -> Result<()>;
}

/// Detector that only logs. Used when no real detection backend is wired in.
#[derive(Default)]
pub struct IdleDetector;

impl IdleDetector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Detector for IdleDetector {
    fn name(&self) -> &'static str {
        "idle"
    }

    async fn start(&self, counters: CounterMap) -> Result<()> {
        tracing::info!(zones = counters.len(), "idle detector attached, counts will not change");
        Ok(())
    }
}
