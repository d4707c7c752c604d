//! zonetally server library entry.
//!
//! Wires the counter map to snapshot persistence, the lazy detector
//! activator, and the HTTP surface. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod activation;
pub mod app_state;
pub mod config;
pub mod http;
pub mod obs;
pub mod ops;
pub mod persistence;
pub mod router;
pub mod serve;
