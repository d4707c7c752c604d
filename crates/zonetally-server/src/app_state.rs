//! Shared application state for the counter server.
//!
//! One `AppState` owns one counter map and everything that touches it. Tests
//! build as many independent instances as they need.

use std::sync::Arc;

use zonetally_core::CounterMap;

use crate::activation::{Detector, LazyActivator};
use crate::config::PersistenceSection;
use crate::obs::ServerMetrics;
use crate::persistence::PersistenceManager;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    counters: CounterMap,
    persistence: Arc<PersistenceManager>,
    activator: LazyActivator,
    metrics: Arc<ServerMetrics>,
}

impl AppState {
    pub fn new(cfg: &PersistenceSection, detector: Arc<dyn Detector>) -> Self {
        let counters = CounterMap::new();
        let metrics = Arc::new(ServerMetrics::default());
        let persistence = Arc::new(PersistenceManager::from_config(
            cfg,
            counters.clone(),
            Arc::clone(&metrics),
        ));
        let activator = LazyActivator::new(detector, counters.clone(), Arc::clone(&metrics));

        Self {
            inner: Arc::new(AppStateInner {
                counters,
                persistence,
                activator,
                metrics,
            }),
        }
    }

    pub fn counters(&self) -> &CounterMap {
        &self.inner.counters
    }

    pub fn persistence(&self) -> Arc<PersistenceManager> {
        Arc::clone(&self.inner.persistence)
    }

    pub fn activator(&self) -> &LazyActivator {
        &self.inner.activator
    }

    pub fn metrics(&self) -> &ServerMetrics {
        &self.inner.metrics
    }

    pub fn set_draining(&self) {
        self.inner.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }
}
