//! Lazy, exactly-once start of the detector.
//!
//! The detector is the external mutator that fills the counter map. It is not
//! started with the process; the first page request starts it. Concurrent
//! first requests race on a compare-and-swap, so at most one start happens.
//! A failed start still consumes the flag: the detector is not retried.

pub mod detector;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use zonetally_core::CounterMap;

use crate::obs::ServerMetrics;

pub use detector::{Detector, IdleDetector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// This call started the detector.
    Started,
    /// Another call already claimed the start.
    AlreadyStarted,
    /// This call claimed the start but the detector returned an error.
    Failed,
}

impl Activation {
    fn as_label(self) -> &'static str {
        match self {
            Activation::Started => "started",
            Activation::AlreadyStarted => "already_started",
            Activation::Failed => "failed",
        }
    }
}

pub struct LazyActivator {
    detector: Arc<dyn Detector>,
    counters: CounterMap,
    metrics: Arc<ServerMetrics>,
    started: AtomicBool,
}

impl LazyActivator {
    pub fn new(detector: Arc<dyn Detector>, counters: CounterMap, metrics: Arc<ServerMetrics>) -> Self {
        Self {
            detector,
            counters,
            metrics,
            started: AtomicBool::new(false),
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub async fn ensure_started(&self) -> Activation {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.record(Activation::AlreadyStarted);
            return Activation::AlreadyStarted;
        }

        let name = self.detector.name();
        let outcome = match self.detector.start(self.counters.clone()).await {
            Ok(()) => {
                tracing::info!(detector = name, "detector started");
                Activation::Started
            }
            Err(e) => {
                tracing::warn!(detector = name, code = e.code(), error = %e, "detector failed to start, not retrying");
                Activation::Failed
            }
        };
        self.record(outcome);
        outcome
    }

    fn record(&self, outcome: Activation) {
        self.metrics.activations.inc(&[("result", outcome.as_label())]);
    }
}
