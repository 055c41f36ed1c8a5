//! Task Pool
//!
//! A named, bounded worker pool over a dedicated rayon thread pool.
//!
//! - `submit` blocks once `workers × queue_depth` tasks are in flight, so a
//!   huge tree never piles up unbounded closures in memory
//! - a panicking task is caught and counted, the pool keeps going
//! - dropping the pool waits for every accepted task
//!
//! Converters run two of these: a conversion pool with N workers and a copy
//! pool with exactly one.

use crate::errors::{BatchError, Result};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Pending tasks allowed per worker before `submit` blocks.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

#[derive(Default)]
struct PoolState {
    in_flight: Mutex<usize>,
    changed: Condvar,
    submitted: AtomicUsize,
    completed: AtomicUsize,
    panicked: AtomicUsize,
}

/// Marks a task finished even if it unwinds.
struct CompletionGuard(Arc<PoolState>);

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.0.completed.fetch_add(1, Ordering::AcqRel);
        let mut in_flight = self.0.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        *in_flight = in_flight.saturating_sub(1);
        self.0.changed.notify_all();
    }
}

pub struct TaskPool {
    name: String,
    workers: usize,
    capacity: usize,
    pool: rayon::ThreadPool,
    state: Arc<PoolState>,
}

impl TaskPool {
    pub fn new(name: &str, workers: usize, queue_depth: usize) -> Result<Self> {
        if workers == 0 {
            return Err(BatchError::invalid("workers", "must be at least 1"));
        }
        let prefix = name.to_string();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(move |i| format!("{}-{}", prefix, i))
            .build()
            .map_err(|e| BatchError::Pool(format!("{}: {}", name, e)))?;

        tracing::debug!(pool = name, workers, queue_depth, "Task pool started");

        Ok(Self {
            name: name.to_string(),
            workers,
            capacity: workers.saturating_mul(queue_depth.max(1)),
            pool,
            state: Arc::new(PoolState::default()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Queue a task, blocking while the pool is at capacity.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut in_flight = self
                .state
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            while *in_flight >= self.capacity {
                in_flight = self
                    .state
                    .changed
                    .wait(in_flight)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            *in_flight += 1;
        }
        self.state.submitted.fetch_add(1, Ordering::AcqRel);

        let state = Arc::clone(&self.state);
        let name = self.name.clone();
        self.pool.spawn(move || {
            let _done = CompletionGuard(Arc::clone(&state));
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                state.panicked.fetch_add(1, Ordering::AcqRel);
                tracing::error!(pool = %name, panic = %panic_message(payload.as_ref()), "Task panicked");
            }
        });
    }

    pub fn submitted(&self) -> usize {
        self.state.submitted.load(Ordering::Acquire)
    }

    pub fn completed(&self) -> usize {
        self.state.completed.load(Ordering::Acquire)
    }

    pub fn panicked(&self) -> usize {
        self.state.panicked.load(Ordering::Acquire)
    }

    pub fn pending(&self) -> usize {
        self.submitted().saturating_sub(self.completed())
    }

    /// Block until every accepted task has finished.
    pub fn wait_idle(&self) {
        let mut in_flight = self
            .state
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while *in_flight > 0 {
            in_flight = self
                .state
                .changed
                .wait(in_flight)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`wait_idle`](Self::wait_idle) but gives up after `timeout`.
    /// Returns whether the pool is idle.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let in_flight = self
            .state
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (in_flight, _) = self
            .state
            .changed
            .wait_timeout_while(in_flight, timeout, |n| *n > 0)
            .unwrap_or_else(PoisonError::into_inner);
        *in_flight == 0
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.wait_idle();
        tracing::debug!(
            pool = %self.name,
            completed = self.completed(),
            panicked = self.panicked(),
            "Task pool drained"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
