//! zonetally core: the shared counter map, its snapshot codec, and error types.
//!
//! This crate carries no runtime or HTTP dependencies. The server crate layers
//! persistence scheduling, lazy activation, and the query surface on top.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. A poisoned counter
//! lock is recovered rather than propagated, and malformed snapshots surface
//! as `ZoneTallyError::Snapshot` so a bad file on disk can never take the
//! serving process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod counters;
pub mod error;
pub mod snapshot;

pub use counters::{CounterMap, CounterSnapshot, Count};
/// Shared result type.
pub use error::{Result, ZoneTallyError};
