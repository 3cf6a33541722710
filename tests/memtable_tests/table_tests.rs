//! MemTable Tests
//!
//! Tests verify:
//! - Insert and replace semantics
//! - Size accounting helpers
//! - Ordered lookups (first, ceiling, higher)
//! - Concurrent inserts

use std::sync::Arc;
use std::thread;

use tidekv::memtable::MemTable;
use tidekv::{KeyValue, Record};

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_memtable_is_empty() {
    let table: MemTable<KeyValue> = MemTable::new();
    assert_eq!(table.len(), 0);
    assert!(table.is_empty());
    assert_eq!(table.serialized_size(), 0);
    assert!(table.first().is_none());
}

#[test]
fn test_insert_new_record() {
    let table = MemTable::new();
    assert!(table.insert(KeyValue::put("k1", "v1", 1)).is_none());
    assert_eq!(table.len(), 1);
    assert!(!table.is_empty());
}

#[test]
fn test_insert_replaces_equal_record() {
    let table = MemTable::new();
    table.insert(KeyValue::put("k1", "short", 1));

    let prev = table.insert(KeyValue::put("k1", "a longer value", 1)).unwrap();
    assert_eq!(&prev.value()[..], b"short");
    assert_eq!(table.len(), 1);
    assert_eq!(&table.first().unwrap().value()[..], b"a longer value");
}

#[test]
fn test_versions_are_distinct_records() {
    let table = MemTable::new();
    table.insert(KeyValue::put("k1", "v1", 1));
    table.insert(KeyValue::put("k1", "v2", 2));
    table.insert(KeyValue::delete("k1", 3));

    assert_eq!(table.len(), 3);
    // Newest version first
    assert_eq!(table.first().unwrap().sequence(), 3);
}

#[test]
fn test_serialized_size_sums_records() {
    let table = MemTable::new();
    let a = KeyValue::put("a", "1", 1);
    let b = KeyValue::put("bb", "22", 2);
    let expected = a.serialized_size() + b.serialized_size();

    table.insert(a);
    table.insert(b);
    assert_eq!(table.serialized_size(), expected);
}

// =============================================================================
// Ordered Lookup Tests
// =============================================================================

fn sample_table() -> MemTable<KeyValue> {
    let table = MemTable::new();
    // Inserted out of order on purpose
    for (key, seq) in [("k3", 3), ("k1", 1), ("k5", 5)] {
        table.insert(KeyValue::put(key, "v", seq));
    }
    table
}

#[test]
fn test_to_vec_is_sorted() {
    let keys: Vec<_> = sample_table()
        .to_vec()
        .into_iter()
        .map(|kv| kv.key().clone())
        .collect();
    assert_eq!(keys, vec!["k1", "k3", "k5"]);
}

#[test]
fn test_ceiling() {
    let table = sample_table();

    let hit = table.ceiling(&KeyValue::seek_key("k3")).unwrap();
    assert_eq!(&hit.key()[..], b"k3");

    let between = table.ceiling(&KeyValue::seek_key("k4")).unwrap();
    assert_eq!(&between.key()[..], b"k5");

    assert!(table.ceiling(&KeyValue::seek_key("k6")).is_none());
}

#[test]
fn test_higher_skips_current() {
    let table = sample_table();
    let first = table.first().unwrap();

    let next = table.higher(&first).unwrap();
    assert_eq!(&next.key()[..], b"k3");

    let last = table.higher(&next).unwrap();
    assert!(table.higher(&last).is_none());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_inserts() {
    let table = Arc::new(MemTable::new());

    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                for i in 0..250u64 {
                    let key = format!("t{}-{:04}", t, i);
                    table.insert(KeyValue::put(key, "v", t * 1000 + i));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(table.len(), 1000);
    let records = table.to_vec();
    assert!(records.windows(2).all(|w| w[0] < w[1]));
}
