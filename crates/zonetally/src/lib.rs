//! Top-level facade crate for zonetally.
//!
//! Re-exports the counter primitives and the server library so users can depend on a single crate.

pub mod core {
    pub use zonetally_core::*;
}

pub mod server {
    pub use zonetally_server::*;
}
