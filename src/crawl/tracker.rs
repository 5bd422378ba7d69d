// src/crawl/tracker.rs
// =============================================================================
// Counts outstanding crawl tasks so the orchestrator knows when we're done.
//
// How it works:
// - Every task is registered (count + 1) *before* it is spawned
// - When the task finishes (or panics) its guard is dropped (count - 1)
// - `wait()` returns once the count reaches zero
//
// A page task registers its children before its own guard drops, so the
// count can only reach zero when the whole tree of work is finished.
//
// Rust concepts:
// - Drop: Code that runs when a value goes out of scope, even during a panic
// - Atomics: Counters that many threads can update without a Mutex
// - Notify: An async "wake up whoever is waiting" signal from tokio
// =============================================================================

use futures::FutureExt; // catch_unwind() on futures
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::error;

#[derive(Debug, Default)]
struct Inner {
    outstanding: AtomicUsize,
    panics: AtomicUsize,
    idle: Notify,
}

// Completion barrier for a crawl (a wait group)
#[derive(Debug, Clone, Default)]
pub struct WorkTracker {
    inner: Arc<Inner>,
}

// Keeps one unit of work registered until it is dropped
#[derive(Debug)]
pub struct WorkGuard {
    inner: Arc<Inner>,
}

impl WorkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // Registers one unit of work
    pub fn enter(&self) -> WorkGuard {
        self.inner.outstanding.fetch_add(1, Ordering::AcqRel);
        WorkGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    // Registers and spawns a task
    //
    // A panic inside `task` is caught and logged here; it doesn't reach the
    // runtime and doesn't affect any other task.
    pub fn spawn<F>(&self, label: String, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = self.enter();

        tokio::spawn(async move {
            if let Err(panic) = AssertUnwindSafe(task).catch_unwind().await {
                guard.inner.panics.fetch_add(1, Ordering::Relaxed);
                error!(task = %label, panic = panic_message(&*panic), "task panicked");
            }
            drop(guard);
        });
    }

    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::Acquire)
    }

    // Number of tasks that ended in a panic
    pub fn panics(&self) -> usize {
        self.inner.panics.load(Ordering::Relaxed)
    }

    // Waits until no work is outstanding
    pub async fn wait(&self) {
        loop {
            // Create the Notified future before checking the count so a
            // notify_waiters() between the check and the await isn't lost
            let idle = self.inner.idle.notified();

            if self.outstanding() == 0 {
                return;
            }

            idle.await;
        }
    }
}

impl Drop for WorkGuard {
    fn drop(&mut self) {
        if self.inner.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

// Best-effort text for a panic payload
fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
