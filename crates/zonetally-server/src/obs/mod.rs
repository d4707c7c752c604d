//! In-process metrics for the counter server.
//!
//! Persistence, activation, and HTTP activity are recorded into atomics and
//! rendered as Prometheus text by the `/metrics` handler.

pub mod metrics;

pub use metrics::ServerMetrics;
