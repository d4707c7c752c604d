//! The shared zone counter map.
//!
//! One `Mutex` guards the whole map. Every read, write, and iteration goes
//! through it, including the copy taken for serialization. The store itself
//! exposes no increment API: the detector mutates through [`CounterMap::lock`]
//! or [`CounterMap::update`].

use std::collections::{btree_map, BTreeMap, HashMap};
use std::ops::AddAssign;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

/// Count stored per zone.
///
/// Detectors usually write integers, but any JSON number is kept as is:
/// a snapshot value of `1.5` loads as `Float(1.5)` and saves back as `1.5`.
/// A non-finite float has no JSON form; it is written as `null` and skipped
/// on the next load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Count {
    Int(i64),
    Float(f64),
}

impl Count {
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Count::Int(i) => Some(i),
            Count::Float(_) => None,
        }
    }
}

impl Default for Count {
    fn default() -> Self {
        Count::Int(0)
    }
}

impl From<i64> for Count {
    fn from(v: i64) -> Self {
        Count::Int(v)
    }
}

impl From<f64> for Count {
    fn from(v: f64) -> Self {
        Count::Float(v)
    }
}

/// Integer counts saturate instead of overflowing.
impl AddAssign<i64> for Count {
    fn add_assign(&mut self, rhs: i64) {
        match self {
            Count::Int(i) => *i = i.saturating_add(rhs),
            Count::Float(f) => *f += rhs as f64,
        }
    }
}

/// Cheaply clonable handle to the process-wide counter map.
#[derive(Clone, Default)]
pub struct CounterMap {
    inner: Arc<Mutex<HashMap<String, Count>>>,
}

impl CounterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive access to the live map.
    ///
    /// A mutator that panicked mid-update poisons the lock; the map is still
    /// a valid `HashMap`, so the guard is recovered instead of panicking here.
    pub fn lock(&self) -> MutexGuard<'_, HashMap<String, Count>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access and return its result.
    pub fn update<R>(&self, f: impl FnOnce(&mut HashMap<String, Count>) -> R) -> R {
        let mut map = self.lock();
        f(&mut map)
    }

    /// Point-in-time copy. The lock is released before this returns.
    pub fn snapshot(&self) -> CounterSnapshot {
        let map = self.lock();
        map.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    /// Additive merge: snapshot keys overwrite, keys absent from the snapshot stay.
    /// Returns the number of entries applied.
    pub fn merge(&self, snapshot: CounterSnapshot) -> usize {
        let mut map = self.lock();
        let applied = snapshot.len();
        map.extend(snapshot.into_inner());
        applied
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Owned, ordered copy of the counter map. Serializes as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CounterSnapshot(BTreeMap<String, Count>);

impl CounterSnapshot {
    pub fn get(&self, zone: &str) -> Option<Count> {
        self.0.get(zone).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Count> {
        self.0.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, Count> {
        self.0
    }
}

impl From<BTreeMap<String, Count>> for CounterSnapshot {
    fn from(map: BTreeMap<String, Count>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Count)> for CounterSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Count)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for CounterSnapshot {
    type Item = (String, Count);
    type IntoIter = btree_map::IntoIter<String, Count>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
