//! Minimal metrics registry.
//!
//! Counters and histograms carry dynamic labels in a `DashMap`; label sets are
//! sorted before lookup so rendering order is stable per label set. Histogram
//! buckets are integer microseconds.

use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn render_labels(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Current value for one label set (0 if never incremented).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{{}}} {}", name, render_labels(r.key()), val);
        }
    }
}

// 1ms, 5ms, 10ms, 50ms, 100ms, 500ms, 1s, 5s
const SAVE_BUCKETS_MICROS: [u64; 8] = [
    1_000, 5_000, 10_000, 50_000, 100_000, 500_000, 1_000_000, 5_000_000,
];

#[derive(Default)]
pub struct Histogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 8],
}

impl Histogram {
    pub fn observe(&self, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(micros, Ordering::Relaxed);
        for (bucket, &le) in self.buckets.iter().zip(SAVE_BUCKETS_MICROS.iter()) {
            if micros <= le {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} histogram", name);
        for (bucket, &le) in self.buckets.iter().zip(SAVE_BUCKETS_MICROS.iter()) {
            let _ = writeln!(out, "{}_bucket{{le=\"{}\"}} {}", name, le, bucket.load(Ordering::Relaxed));
        }
        let count = self.count();
        let _ = writeln!(out, "{}_bucket{{le=\"+Inf\"}} {}", name, count);
        let _ = writeln!(out, "{}_sum {}", name, self.sum.load(Ordering::Relaxed));
        let _ = writeln!(out, "{}_count {}", name, count);
    }
}

#[derive(Default)]
pub struct ServerMetrics {
    /// `result` = ok | error
    pub snapshot_saves: CounterVec,
    /// `result` = loaded | missing | corrupt
    pub snapshot_loads: CounterVec,
    /// `result` = started | already_started | failed
    pub activations: CounterVec,
    /// `route` = page | zone_counters
    pub http_requests: CounterVec,
    pub save_duration: Histogram,
    draining: AtomicBool,
}

impl ServerMetrics {
    pub fn set_draining(&self) {
        self.draining.store(true, Ordering::Relaxed);
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Relaxed)
    }

    /// Render everything; `zones` is read by the caller under the counter lock.
    pub fn render(&self, zones: usize) -> String {
        let mut out = String::new();
        self.snapshot_saves.render("zonetally_snapshot_saves_total", &mut out);
        self.snapshot_loads.render("zonetally_snapshot_loads_total", &mut out);
        self.activations.render("zonetally_activations_total", &mut out);
        self.http_requests.render("zonetally_http_requests_total", &mut out);
        self.save_duration.render("zonetally_save_duration_micros", &mut out);
        let _ = writeln!(out, "# TYPE zonetally_zones gauge\nzonetally_zones {}", zones);
        let _ = writeln!(
            out,
            "# TYPE zonetally_draining gauge\nzonetally_draining {}",
            u8::from(self.is_draining())
        );
        out
    }
}
