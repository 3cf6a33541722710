//! Flush state machine
//!
//! ```text
//!   Idle ──► Snapshotting ──► Flushing ──┬──► Idle   (sink succeeded)
//!                                        └──► Stuck  (retries exhausted)
//! ```
//!
//! Every change goes through [`FlushFlag::transition`], a single
//! compare-and-swap, so losing racers simply observe `false`.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Where a memstore is in its snapshot/flush cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushState {
    /// No flush in flight
    Idle,
    /// A flush task has been claimed but has not swapped the tables yet
    Snapshotting,
    /// The snapshot is being written to the sink
    Flushing,
    /// Every attempt failed; the snapshot is retained until intervention
    Stuck,
}

impl FlushState {
    fn as_u8(self) -> u8 {
        match self {
            FlushState::Idle => 0,
            FlushState::Snapshotting => 1,
            FlushState::Flushing => 2,
            FlushState::Stuck => 3,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => FlushState::Idle,
            1 => FlushState::Snapshotting,
            2 => FlushState::Flushing,
            _ => FlushState::Stuck,
        }
    }

    /// True for every state except `Idle`
    pub fn in_flight(self) -> bool {
        self != FlushState::Idle
    }

    /// Whether `self -> next` is an edge of the state machine
    pub fn can_transition_to(self, next: FlushState) -> bool {
        matches!(
            (self, next),
            (FlushState::Idle, FlushState::Snapshotting)
                | (FlushState::Snapshotting, FlushState::Flushing)
                | (FlushState::Snapshotting, FlushState::Idle)
                | (FlushState::Flushing, FlushState::Idle)
                | (FlushState::Flushing, FlushState::Stuck)
        )
    }
}

impl fmt::Display for FlushState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlushState::Idle => "idle",
            FlushState::Snapshotting => "snapshotting",
            FlushState::Flushing => "flushing",
            FlushState::Stuck => "stuck",
        };
        f.write_str(name)
    }
}

/// Atomic holder of a [`FlushState`]
///
/// `Snapshotting -> Idle` is only used to roll back a claim whose task could
/// not be submitted.
#[derive(Debug)]
pub struct FlushFlag {
    state: AtomicU8,
}

impl FlushFlag {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(FlushState::Idle.as_u8()),
        }
    }

    /// Current state (lock-free, possibly stale by the time it is used)
    pub fn load(&self) -> FlushState {
        FlushState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move from `from` to `to` if the flag currently holds `from` and the
    /// edge exists. Returns whether this caller performed the transition.
    pub fn transition(&self, from: FlushState, to: FlushState) -> bool {
        if !from.can_transition_to(to) {
            return false;
        }
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for FlushFlag {
    fn default() -> Self {
        Self::new()
    }
}
