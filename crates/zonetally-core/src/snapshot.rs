//! Snapshot codec (JSON object, zone -> count).
//!
//! Decoding rules:
//! - The document must be a JSON object; anything else is a `Snapshot` error.
//! - Any JSON number is a count. Integers that fit `i64` stay integers, every
//!   other number (`1.5`, `3.0`, integers past `i64::MAX`) is kept as a float.
//! - Entries whose value is not a number are skipped with a warning, so one
//!   bad value yields a partial mapping instead of an empty one.

use serde_json::{Map, Value};

use crate::counters::{Count, CounterSnapshot};
use crate::error::{Result, ZoneTallyError};

/// Serialize a snapshot to bytes ready for disk.
pub fn encode(snapshot: &CounterSnapshot) -> Result<Vec<u8>> {
    serde_json::to_vec(snapshot)
        .map_err(|e| ZoneTallyError::Snapshot(format!("encode failed: {e}")))
}

/// Parse snapshot bytes.
pub fn decode(bytes: &[u8]) -> Result<CounterSnapshot> {
    let doc: Value = serde_json::from_slice(bytes)
        .map_err(|e| ZoneTallyError::Snapshot(format!("invalid json: {e}")))?;

    match doc {
        Value::Object(entries) => Ok(decode_entries(entries)),
        other => Err(ZoneTallyError::Snapshot(format!(
            "expected a json object, found {}",
            kind_of(&other)
        ))),
    }
}

fn decode_entries(entries: Map<String, Value>) -> CounterSnapshot {
    let mut out = Vec::with_capacity(entries.len());
    for (zone, value) in entries {
        match as_count(&value) {
            Some(count) => out.push((zone, count)),
            None => {
                tracing::warn!(zone = %zone, value = %value, "snapshot entry is not a number, skipped");
            }
        }
    }
    out.into_iter().collect()
}

fn as_count(value: &Value) -> Option<Count> {
    let Value::Number(n) = value else {
        return None;
    };
    match n.as_i64() {
        Some(i) => Some(Count::Int(i)),
        None => n.as_f64().map(Count::Float),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
