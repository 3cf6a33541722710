//! Tests for RunStore
//!
//! These tests verify:
//! - Opening/creating storage directories
//! - Flushing snapshots into runs through the FlushSink contract
//! - Newest-first ordering of runs
//! - Persistence (restart and rediscover runs)
//! - Cleanup of partial runs

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use tidekv::iter::{SeekIter, TableIter};
use tidekv::memtable::MemTable;
use tidekv::storage::RunStore;
use tidekv::{FlushSink, KeyValue, TideError};

use super::{files_with_extension, setup_temp_storage, VecSource};

fn snapshot(records: Vec<KeyValue>) -> TableIter<KeyValue> {
    let table = MemTable::new();
    for record in records {
        table.insert(record);
    }
    TableIter::new(Arc::new(table))
}

// =============================================================================
// Open/Create Tests
// =============================================================================

#[test]
fn test_open_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("runs");
    assert!(!path.exists());

    let store = RunStore::open(&path).unwrap();
    assert!(path.is_dir());
    assert_eq!(store.data_dir(), path.as_path());
}

#[test]
fn test_open_empty_directory() {
    let (_temp, path) = setup_temp_storage();
    let store = RunStore::open(&path).unwrap();

    assert_eq!(store.run_count(), 0);
    assert_eq!(store.next_run_id(), 1);
    assert_eq!(store.max_sequence(), 0);
    assert!(store.sources().is_empty());
}

// =============================================================================
// Flush Tests
// =============================================================================

#[test]
fn test_flush_writes_run() {
    let (_temp, path) = setup_temp_storage();
    let store = RunStore::open(&path).unwrap();

    let mut records = snapshot(vec![
        KeyValue::put("b", "2", 2),
        KeyValue::put("a", "1", 1),
    ]);
    store.flush(&mut records).unwrap();

    assert_eq!(store.run_count(), 1);
    assert_eq!(store.entry_count(), 2);
    assert_eq!(store.max_sequence(), 2);
    assert_eq!(files_with_extension(&path, "run"), vec!["run_000001.run"]);
    assert!(files_with_extension(&path, "tmp").is_empty());

    let mut sources = store.sources();
    let flushed = sources[0].collect_remaining().unwrap();
    assert_eq!(&flushed[0].key()[..], b"a");
    assert_eq!(&flushed[1].key()[..], b"b");
}

#[test]
fn test_empty_flush_writes_nothing() {
    let (_temp, path) = setup_temp_storage();
    let store = RunStore::open(&path).unwrap();

    store.flush(&mut snapshot(Vec::new())).unwrap();

    assert_eq!(store.run_count(), 0);
    assert!(files_with_extension(&path, "run").is_empty());
    assert!(files_with_extension(&path, "tmp").is_empty());
}

#[test]
fn test_failed_flush_leaves_no_files() {
    let (_temp, path) = setup_temp_storage();
    let store = RunStore::open(&path).unwrap();

    let mut unsorted = VecSource::new(vec![
        KeyValue::put("b", "2", 2),
        KeyValue::put("a", "1", 1),
    ]);
    let err = store.flush(&mut unsorted).unwrap_err();
    assert!(matches!(err, TideError::Storage(_)));

    assert_eq!(store.run_count(), 0);
    assert!(files_with_extension(&path, "run").is_empty());
    assert!(files_with_extension(&path, "tmp").is_empty());

    // A retry with good input lands under a fresh id
    store
        .flush(&mut snapshot(vec![KeyValue::put("a", "1", 1)]))
        .unwrap();
    assert_eq!(store.run_count(), 1);
}

#[test]
fn test_runs_are_newest_first() {
    let (_temp, path) = setup_temp_storage();
    let store = RunStore::open(&path).unwrap();

    store
        .flush(&mut snapshot(vec![KeyValue::put("k", "old", 1)]))
        .unwrap();
    store
        .flush(&mut snapshot(vec![KeyValue::put("k", "new", 2)]))
        .unwrap();

    let mut sources = store.sources();
    assert_eq!(sources.len(), 2);
    assert_eq!(&sources[0].advance().unwrap().value()[..], b"new");
    assert_eq!(&sources[1].advance().unwrap().value()[..], b"old");
}

#[test]
fn test_might_contain_across_runs() {
    let (_temp, path) = setup_temp_storage();
    let store = RunStore::open(&path).unwrap();
    store
        .flush(&mut snapshot(vec![
            KeyValue::put("c", "v", 1),
            KeyValue::put("e", "v", 2),
        ]))
        .unwrap();

    assert!(store.might_contain(b"d"));
    assert!(!store.might_contain(b"a"));
    assert!(!store.might_contain(b"f"));
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_reopen_discovers_runs() {
    let (_temp, path) = setup_temp_storage();

    {
        let store = RunStore::open(&path).unwrap();
        store
            .flush(&mut snapshot(vec![KeyValue::put("k", "old", 1)]))
            .unwrap();
        store
            .flush(&mut snapshot(vec![KeyValue::put("k", "new", 7)]))
            .unwrap();
    }

    let store = RunStore::open(&path).unwrap();
    assert_eq!(store.run_count(), 2);
    assert_eq!(store.next_run_id(), 3);
    assert_eq!(store.max_sequence(), 7);

    let mut sources = store.sources();
    assert_eq!(&sources[0].advance().unwrap().value()[..], b"new");
}

#[test]
fn test_open_removes_partial_runs() {
    let (_temp, path) = setup_temp_storage();
    fs::write(path.join("run_000004.tmp"), b"half written").unwrap();
    fs::write(path.join("notes.txt"), b"unrelated").unwrap();

    let store = RunStore::open(&path).unwrap();
    assert_eq!(store.run_count(), 0);
    assert!(files_with_extension(&path, "tmp").is_empty());
    // Unrelated files are left alone
    assert!(path.join("notes.txt").exists());
}

#[test]
fn test_open_fails_on_corrupt_run() {
    let (_temp, path) = setup_temp_storage();
    fs::write(path.join("run_000001.run"), b"garbage").unwrap();

    assert!(matches!(
        RunStore::open(&path),
        Err(TideError::Corruption(_))
    ));
}
