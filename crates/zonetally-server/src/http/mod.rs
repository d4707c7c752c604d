//! Public HTTP surface.
//!
//! - `/`                  : status page (starts the detector on first view)
//! - `/api/zone_counters` : current counter map as a JSON object

pub mod api;
pub mod page;
