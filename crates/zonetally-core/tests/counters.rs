//! Counter map locking and merge behavior.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::BTreeMap;
use std::thread;

use zonetally_core::{Count, CounterMap, CounterSnapshot};

fn snapshot_of(entries: &[(&str, i64)]) -> CounterSnapshot {
    entries.iter().map(|(k, v)| (k.to_string(), Count::Int(*v))).collect()
}

#[test]
fn merge_keeps_keys_absent_from_snapshot() {
    let counters = CounterMap::new();
    counters.lock().insert("B".into(), Count::Int(2));

    let applied = counters.merge(snapshot_of(&[("A", 1)]));

    assert_eq!(applied, 1);
    assert_eq!(counters.snapshot(), snapshot_of(&[("A", 1), ("B", 2)]));
}

#[test]
fn merge_snapshot_wins_on_conflict() {
    let counters = CounterMap::new();
    counters.lock().insert("A".into(), Count::Int(5));

    counters.merge(snapshot_of(&[("A", 1)]));

    assert_eq!(counters.snapshot().get("A"), Some(Count::Int(1)));
    assert_eq!(counters.len(), 1);
}

#[test]
fn snapshot_is_detached_from_live_map() {
    let counters = CounterMap::new();
    counters.update(|m| m.insert("north".into(), Count::Int(3)));

    let snap = counters.snapshot();
    counters.update(|m| {
        m.insert("north".into(), Count::Int(4));
        m.insert("south".into(), Count::Int(1));
    });

    assert_eq!(snap.get("north"), Some(Count::Int(3)));
    assert_eq!(snap.get("south"), None);
    assert_eq!(snap.len(), 1);
}

#[test]
fn clones_share_one_map() {
    let a = CounterMap::new();
    let b = a.clone();
    b.update(|m| *m.entry("gate".into()).or_insert(Count::Int(0)) += 7);
    assert_eq!(a.snapshot().get("gate"), Some(Count::Int(7)));
    assert!(!a.is_empty());
}

#[test]
fn poisoned_lock_is_recovered() {
    let counters = CounterMap::new();
    counters.update(|m| m.insert("z".into(), Count::Int(1)));

    let c = counters.clone();
    let res = thread::spawn(move || {
        c.update(|m| {
            m.insert("z".into(), Count::Int(2));
            panic!("mutator crashed while holding the lock");
        })
    })
    .join();
    assert!(res.is_err());

    assert_eq!(counters.snapshot().get("z"), Some(Count::Int(2)));
}

#[test]
fn concurrent_writers_and_readers_never_tear() {
    let counters = CounterMap::new();
    let writers = 4;
    let per_writer = 500;

    let mut handles = Vec::new();
    for w in 0..writers {
        let c = counters.clone();
        handles.push(thread::spawn(move || {
            for i in 0..per_writer {
                c.update(|m| {
                    // Two keys written in one critical section must be seen together.
                    m.insert(format!("w{w}-{i}"), Count::Int(i));
                    *m.entry("total".into()).or_default() += 1;
                });
            }
        }));
    }

    let reader = {
        let c = counters.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                let snap = c.snapshot();
                let per_key = snap.iter().filter(|(k, _)| k.as_str() != "total").count() as i64;
                assert_eq!(snap.get("total").unwrap_or_default(), Count::Int(per_key));
            }
        })
    };

    for h in handles {
        h.join().unwrap();
    }
    reader.join().unwrap();

    let snap = counters.snapshot();
    assert_eq!(snap.get("total"), Some(Count::Int(writers * per_writer)));
    assert_eq!(snap.len(), (writers * per_writer) as usize + 1);
}

#[test]
fn snapshot_serializes_as_flat_object() {
    let snap: CounterSnapshot = BTreeMap::from([
        ("b".to_string(), Count::from(2)),
        ("a".to_string(), Count::from(1)),
        ("c".to_string(), Count::from(0.5)),
    ])
    .into();
    let json = serde_json::to_string(&snap).unwrap();
    assert_eq!(json, r#"{"a":1,"b":2,"c":0.5}"#);

    assert_eq!(snap.into_inner().len(), 3);
}

#[test]
fn increments_saturate_and_keep_fractions() {
    let counters = CounterMap::new();
    counters.update(|m| {
        m.insert("max".into(), Count::Int(i64::MAX));
        m.insert("weight".into(), Count::Float(1.5));
    });
    counters.update(|m| {
        for c in m.values_mut() {
            *c += 1;
        }
    });

    let snap = counters.snapshot();
    assert_eq!(snap.get("max"), Some(Count::Int(i64::MAX)));
    assert_eq!(snap.get("weight"), Some(Count::Float(2.5)));
    assert_eq!(snap.get("weight").and_then(Count::as_i64), None);
}
