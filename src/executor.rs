//! Task Executors
//!
//! Flushes are handed to an executor as boxed closures; completion is only
//! communicated back through the memstore's flush state, so the memstore does
//! not care which substrate runs them.
//!
//! ## Provided executors
//! - `FlushPool`: fixed set of named worker threads fed by a crossbeam channel
//! - `InlineExecutor`: runs the task on the submitting thread (deterministic tests)

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender};
use parking_lot::Mutex;

use crate::error::{Result, TideError};

/// A unit of background work
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run tasks
pub trait TaskExecutor: Send + Sync {
    /// Queue `task` for execution. Fails with `ExecutorClosed` after shutdown.
    fn execute(&self, task: Task) -> Result<()>;
}

/// Bounded worker pool
///
/// ## Concurrency:
/// - `sender`: `None` once shut down; guarded so shutdown and submit don't race
/// - Workers drain the queue before exiting, so queued flushes still run
pub struct FlushPool {
    sender: Mutex<Option<Sender<Task>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl FlushPool {
    /// Start `size` worker threads (at least one)
    pub fn new(size: usize) -> Result<Self> {
        let size = size.max(1);
        let (sender, receiver) = channel::unbounded::<Task>();

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("tidekv-flush-{}", id))
                .spawn(move || {
                    for task in receiver.iter() {
                        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                            tracing::error!(worker = id, "Flush task panicked");
                        }
                    }
                    tracing::trace!(worker = id, "Flush worker exiting");
                })?;
            workers.push(handle);
        }

        tracing::debug!(workers = size, "Flush pool started");

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        })
    }

    /// Number of live worker threads
    pub fn size(&self) -> usize {
        self.workers.lock().len()
    }

    /// Stop accepting tasks, let queued ones finish, and join the workers
    pub fn shutdown(&self) {
        // Dropping the sender disconnects the channel once the queue drains
        drop(self.sender.lock().take());

        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        let current = thread::current().id();
        for handle in workers {
            // A flush task dropping the last engine handle would otherwise
            // join itself
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                tracing::warn!("Flush worker terminated abnormally");
            }
        }
    }
}

impl TaskExecutor for FlushPool {
    fn execute(&self, task: Task) -> Result<()> {
        let guard = self.sender.lock();
        let sender = guard.as_ref().ok_or(TideError::ExecutorClosed)?;
        sender.send(task).map_err(|_| TideError::ExecutorClosed)
    }
}

impl Drop for FlushPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Runs every task immediately on the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl TaskExecutor for InlineExecutor {
    fn execute(&self, task: Task) -> Result<()> {
        task();
        Ok(())
    }
}
