//! Snapshot persistence for the counter map.
//!
//! - Load-on-start: best-effort additive merge of the file on disk.
//! - Save: copy under the counter lock, write outside it, atomic rename.
//! - Autosave: fixed-interval background loop, started at most once.
//! - Shutdown flush: one final save, at most once.
//!
//! Nothing here returns an error to the serving path. Failures are logged,
//! counted, and retried only by the next autosave tick.

pub mod atomic;
pub mod autosave;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use zonetally_core::error::{Result, ZoneTallyError};
use zonetally_core::{snapshot, CounterMap};

use crate::config::PersistenceSection;
use crate::obs::ServerMetrics;

pub use autosave::AutosaveHandle;

/// What load-on-start found on disk. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No snapshot file; the map is left as is.
    Missing,
    /// Snapshot merged; `entries` keys were written into the map.
    Loaded { entries: usize },
    /// File present but unreadable or unparseable; treated as missing.
    Corrupt,
}

impl LoadOutcome {
    fn as_label(self) -> &'static str {
        match self {
            LoadOutcome::Missing => "missing",
            LoadOutcome::Loaded { .. } => "loaded",
            LoadOutcome::Corrupt => "corrupt",
        }
    }
}

pub struct PersistenceManager {
    path: PathBuf,
    interval: Duration,
    counters: CounterMap,
    metrics: Arc<ServerMetrics>,
    // Serializes copy + disk write of overlapping saves. Taken before the
    // counter lock, and the counter lock is released before any disk I/O.
    write_lock: Mutex<()>,
    autosave_started: AtomicBool,
    flushed: AtomicBool,
}

impl PersistenceManager {
    pub fn new(
        path: impl Into<PathBuf>,
        interval: Duration,
        counters: CounterMap,
        metrics: Arc<ServerMetrics>,
    ) -> Self {
        Self {
            path: path.into(),
            interval,
            counters,
            metrics,
            write_lock: Mutex::new(()),
            autosave_started: AtomicBool::new(false),
            flushed: AtomicBool::new(false),
        }
    }

    pub fn from_config(
        cfg: &PersistenceSection,
        counters: CounterMap,
        metrics: Arc<ServerMetrics>,
    ) -> Self {
        Self::new(cfg.path.clone(), cfg.save_interval(), counters, metrics)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Merge the snapshot file (if any) into the counter map. Never fails.
    pub fn load_on_start(&self) -> LoadOutcome {
        let outcome = self.load();
        self.metrics
            .snapshot_loads
            .inc(&[("result", outcome.as_label())]);
        outcome
    }

    fn load(&self) -> LoadOutcome {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no snapshot on disk, starting empty");
                return LoadOutcome::Missing;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read snapshot, ignoring it");
                return LoadOutcome::Corrupt;
            }
        };

        match snapshot::decode(&bytes) {
            Ok(snap) => {
                let entries = self.counters.merge(snap);
                tracing::info!(path = %self.path.display(), entries, "snapshot merged");
                LoadOutcome::Loaded { entries }
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), code = e.code(), error = %e, "failed to parse snapshot, ignoring it");
                LoadOutcome::Corrupt
            }
        }
    }

    /// Copy, serialize, and atomically replace the snapshot file.
    /// Returns the number of zones written.
    pub fn try_save(&self) -> Result<usize> {
        let started = Instant::now();

        // Lock order: write_lock, then the counter lock (inside snapshot()).
        // Copying under write_lock keeps disk order equal to copy order, so an
        // older copy can never land after a newer one.
        let _write = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let snap = self.counters.snapshot();
        let zones = snap.len();
        let bytes = snapshot::encode(&snap)?;

        atomic::write_atomic(&self.path, &bytes).map_err(|e| {
            ZoneTallyError::Io(format!("write {} failed: {e}", self.path.display()))
        })?;

        self.metrics.save_duration.observe(started.elapsed());
        Ok(zones)
    }

    /// Best-effort save. Returns whether the file was replaced.
    pub fn save(&self) -> bool {
        match self.try_save() {
            Ok(zones) => {
                self.metrics.snapshot_saves.inc(&[("result", "ok")]);
                tracing::debug!(path = %self.path.display(), zones, "snapshot saved");
                true
            }
            Err(e) => {
                self.metrics.snapshot_saves.inc(&[("result", "error")]);
                tracing::warn!(path = %self.path.display(), code = e.code(), error = %e, "failed to save snapshot");
                false
            }
        }
    }

    /// Spawn the autosave loop on the current tokio runtime.
    /// Returns `None` if this manager already started one.
    pub fn start_autosave(self: &Arc<Self>) -> Option<AutosaveHandle> {
        if self
            .autosave_started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("autosave already running");
            return None;
        }
        Some(AutosaveHandle::spawn(Arc::clone(self), self.interval))
    }

    /// Final save on graceful shutdown. Only the first call writes.
    pub fn shutdown_flush(&self) -> bool {
        if self.flushed.swap(true, Ordering::AcqRel) {
            return false;
        }
        tracing::info!(path = %self.path.display(), "flushing counters before exit");
        self.save()
    }
}
