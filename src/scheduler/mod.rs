//! Pluggable wake-up scheduling.
//!
//! Whenever one side of a pipe needs to resume the other (new data flushed,
//! space drained below the resume threshold, completion, cancellation), the
//! wake-up is dispatched through the pipe's [`Scheduler`]. This keeps the
//! execution strategy out of the core: wake inline on the calling thread,
//! hop to a dedicated thread, or hand off to whatever executor the
//! application already runs.
//!
//! - [`InlineScheduler`] - runs the wake on the calling thread (default)
//! - [`ThreadScheduler`] - one dedicated dispatch thread per instance
//! - any `Fn(Task) + Send + Sync` closure - bridge to thread pools
//!
//! # Example
//!
//! ```
//! use bytepipe::{PipeConfig, Scheduler};
//! use std::sync::Arc;
//!
//! // Dispatch wake-ups through a closure (e.g. a thread-pool spawn).
//! let config = PipeConfig::default()
//!     .with_scheduler(Arc::new(|task: bytepipe::Task| task()));
//! assert!(config.validate().is_ok());
//! ```

use std::sync::Mutex;
use std::sync::mpsc::{Sender, channel};
use std::thread::JoinHandle;

/// A deferred wake-up callback.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Execution strategy for pipe wake-ups.
///
/// Implementations must be cheap to call and must eventually run every
/// scheduled task; a task that is silently dropped leaves the peer
/// suspended forever.
pub trait Scheduler: Send + Sync {
    /// Runs or enqueues `task`.
    fn schedule(&self, task: Task);
}

impl<F> Scheduler for F
where
    F: Fn(Task) + Send + Sync,
{
    fn schedule(&self, task: Task) {
        self(task)
    }
}

/// Runs wake-ups synchronously on the thread that triggered them.
///
/// This is the default. It has the best cache locality (the resumed task
/// often continues on the data the current thread just touched) and is the
/// right choice for single-threaded deterministic tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineScheduler;

impl Scheduler for InlineScheduler {
    fn schedule(&self, task: Task) {
        task()
    }
}

/// Runs wake-ups on one dedicated thread owned by this scheduler.
///
/// Useful when reader and writer would otherwise be resumed on the same
/// single-threaded executor and deadlock, or to keep wake-up latency off
/// the I/O thread. Dropping the scheduler stops the thread after draining
/// already-queued tasks; tasks scheduled after that run inline as a
/// fallback.
pub struct ThreadScheduler {
    tx: Mutex<Option<Sender<Task>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ThreadScheduler {
    /// Spawns the dispatch thread.
    pub fn new() -> Self {
        let (tx, rx) = channel::<Task>();
        let handle = std::thread::spawn(move || {
            for task in rx {
                task();
            }
        });
        Self {
            tx: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
        }
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&self, task: Task) {
        let guard = match self.tx.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        match guard.as_ref().map(|tx| tx.send(task)) {
            Some(Ok(())) => {}
            // Thread gone: waking inline is always safe.
            Some(Err(err)) => (err.0)(),
            None => {}
        }
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.tx.lock() {
            guard.take();
        }
        if let Ok(mut guard) = self.handle.lock() {
            if let Some(handle) = guard.take() {
                let _ = handle.join();
            }
        }
    }
}

impl std::fmt::Debug for ThreadScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadScheduler").finish_non_exhaustive()
    }
}
