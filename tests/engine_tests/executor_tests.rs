//! Tests for the task executors

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel;
use tidekv::executor::{FlushPool, InlineExecutor, TaskExecutor};
use tidekv::iter::SeekIter;
use tidekv::{Config, FlushSink, FlushState, KeyValue, MemStore, Result, TideError};

struct NullSink;

impl FlushSink<KeyValue> for NullSink {
    fn flush(&self, records: &mut dyn SeekIter<KeyValue>) -> Result<()> {
        records.collect_remaining().map(|_| ())
    }
}

#[test]
fn test_pool_runs_tasks() {
    let pool = FlushPool::new(3).unwrap();
    assert_eq!(pool.size(), 3);

    let (tx, rx) = channel::unbounded();
    for i in 0..10 {
        let tx = tx.clone();
        pool.execute(Box::new(move || tx.send(i).unwrap())).unwrap();
    }

    let mut seen: Vec<i32> = (0..10)
        .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
        .collect();
    seen.sort();
    assert_eq!(seen, (0..10).collect::<Vec<_>>());
}

#[test]
fn test_pool_threads_are_named() {
    let pool = FlushPool::new(1).unwrap();
    let (tx, rx) = channel::bounded(1);
    pool.execute(Box::new(move || {
        let name = thread::current().name().map(str::to_string);
        tx.send(name).unwrap();
    }))
    .unwrap();

    let name = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
    assert!(name.starts_with("tidekv-flush-"));
}

#[test]
fn test_shutdown_drains_queue() {
    let pool = FlushPool::new(1).unwrap();
    let done = Arc::new(AtomicUsize::new(0));

    for _ in 0..5 {
        let done = Arc::clone(&done);
        pool.execute(Box::new(move || {
            thread::sleep(Duration::from_millis(10));
            done.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();
    }

    pool.shutdown();
    assert_eq!(done.load(Ordering::SeqCst), 5);
    assert_eq!(pool.size(), 0);
}

#[test]
fn test_execute_after_shutdown_fails() {
    let pool = FlushPool::new(1).unwrap();
    pool.shutdown();

    let result = pool.execute(Box::new(|| {}));
    assert!(matches!(result, Err(TideError::ExecutorClosed)));
}

#[test]
fn test_panicking_task_keeps_worker() {
    let pool = FlushPool::new(1).unwrap();
    pool.execute(Box::new(|| panic!("task failure"))).unwrap();

    let (tx, rx) = channel::bounded(1);
    pool.execute(Box::new(move || tx.send(()).unwrap())).unwrap();
    assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
}

#[test]
fn test_inline_runs_on_caller() {
    let caller = thread::current().id();
    let (tx, rx) = channel::bounded(1);

    InlineExecutor
        .execute(Box::new(move || tx.send(thread::current().id()).unwrap()))
        .unwrap();
    assert_eq!(rx.try_recv().unwrap(), caller);
}

#[test]
fn test_rejected_submission_rolls_back_claim() {
    let pool = Arc::new(FlushPool::new(1).unwrap());
    let store = MemStore::new(&Config::default(), Arc::new(NullSink), pool.clone()).unwrap();
    store.put(KeyValue::put("k", "v", 1)).unwrap();

    pool.shutdown();
    assert!(!store.request_flush());
    assert_eq!(store.flush_state(), FlushState::Idle);
    assert_eq!(store.active_len(), 1);
}
