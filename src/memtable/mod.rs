//! MemTable Module
//!
//! In-memory data structures for recent writes.
//!
//! ## Responsibilities
//! - Sorted, concurrently writable container (`MemTable`)
//! - Exact size tracking for flush triggers
//! - Snapshot/flush coordination with backpressure (`MemStore`)
//! - Merged, ordered read view over active table and snapshot
//!
//! ## Data Structure Choice
//! BTreeSet wrapped in a parking_lot RwLock:
//! - Ordered records (required for run generation and seek)
//! - Native O(log n) tail lookups for `seek`
//! - Simple and correct first; a skip list can replace it behind the same API

mod state;
mod store;
mod table;

pub use state::{FlushFlag, FlushState};
pub use store::{FlushSink, MemStore};
pub use table::MemTable;
