//! Flush state machine tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use tidekv::memtable::{FlushFlag, FlushState};

#[test]
fn test_starts_idle() {
    let flag = FlushFlag::new();
    assert_eq!(flag.load(), FlushState::Idle);
    assert!(!flag.load().in_flight());
}

#[test]
fn test_full_cycle() {
    let flag = FlushFlag::new();
    assert!(flag.transition(FlushState::Idle, FlushState::Snapshotting));
    assert!(flag.transition(FlushState::Snapshotting, FlushState::Flushing));
    assert!(flag.load().in_flight());
    assert!(flag.transition(FlushState::Flushing, FlushState::Idle));
    assert_eq!(flag.load(), FlushState::Idle);
}

#[test]
fn test_stuck_is_terminal() {
    let flag = FlushFlag::new();
    flag.transition(FlushState::Idle, FlushState::Snapshotting);
    flag.transition(FlushState::Snapshotting, FlushState::Flushing);
    assert!(flag.transition(FlushState::Flushing, FlushState::Stuck));

    for next in [
        FlushState::Idle,
        FlushState::Snapshotting,
        FlushState::Flushing,
    ] {
        assert!(!flag.transition(FlushState::Stuck, next));
    }
    assert_eq!(flag.load(), FlushState::Stuck);
    assert!(flag.load().in_flight());
}

#[test]
fn test_rejects_missing_edges() {
    assert!(!FlushState::Idle.can_transition_to(FlushState::Flushing));
    assert!(!FlushState::Idle.can_transition_to(FlushState::Stuck));
    assert!(!FlushState::Snapshotting.can_transition_to(FlushState::Stuck));
    assert!(FlushState::Snapshotting.can_transition_to(FlushState::Idle));

    let flag = FlushFlag::new();
    assert!(!flag.transition(FlushState::Idle, FlushState::Flushing));
    assert_eq!(flag.load(), FlushState::Idle);
}

#[test]
fn test_transition_from_wrong_state_fails() {
    let flag = FlushFlag::new();
    assert!(!flag.transition(FlushState::Snapshotting, FlushState::Flushing));
    assert_eq!(flag.load(), FlushState::Idle);
}

#[test]
fn test_display() {
    assert_eq!(FlushState::Idle.to_string(), "idle");
    assert_eq!(FlushState::Stuck.to_string(), "stuck");
}

#[test]
fn test_single_winner_under_contention() {
    let flag = Arc::new(FlushFlag::new());
    let barrier = Arc::new(Barrier::new(16));
    let winners = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let flag = Arc::clone(&flag);
            let barrier = Arc::clone(&barrier);
            let winners = Arc::clone(&winners);
            thread::spawn(move || {
                barrier.wait();
                if flag.transition(FlushState::Idle, FlushState::Snapshotting) {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(winners.load(Ordering::SeqCst), 1);
}
