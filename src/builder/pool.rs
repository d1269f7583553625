//! Fixed-size worker pool for compile tasks.
//!
//! Tasks are pulled from a single FIFO queue by `N` worker threads. Every
//! [`WorkerPool::submit`] returns a [`TaskHandle`], and [`WorkerPool::barrier`]
//! waits on every handle that is still outstanding. When `barrier` returns the
//! queue is empty and no worker is executing a task.
//!
//! Dropping the pool is not a barrier. Queued tasks that have not started are
//! discarded and their handles report [`PoolError::Abandoned`]; tasks already
//! running finish, then the workers are joined.

use std::any::Any;
use std::collections::VecDeque;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex, MutexGuard};
use thiserror::Error;

/// Why a task did not produce a value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("task panicked: {message}")]
    Panicked { message: String },

    #[error("task was abandoned before it started")]
    Abandoned,
}

type Job = Box<dyn FnOnce() + Send + 'static>;

struct QueueState {
    jobs: VecDeque<Job>,
    active: usize,
    stop: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl Shared {
    fn finish_one(&self) {
        self.state.lock().active -= 1;
    }
}

/// Completion slot shared between a running task and its handle.
struct Slot<T> {
    result: Mutex<Option<Result<T, PoolError>>>,
    done: Condvar,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Slot {
            result: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn fill(&self, value: Result<T, PoolError>) {
        let mut result = self.result.lock();
        if result.is_none() {
            *result = Some(value);
        }
        self.done.notify_all();
    }

    fn wait(&self) -> MutexGuard<'_, Option<Result<T, PoolError>>> {
        let mut result = self.result.lock();
        while result.is_none() {
            self.done.wait(&mut result);
        }
        result
    }
}

/// Type-erased view of a slot, used by the barrier.
trait Outstanding: Send + Sync {
    fn wait_done(&self);
}

impl<T: Send> Outstanding for Slot<T> {
    fn wait_done(&self) {
        drop(self.wait());
    }
}

/// Fills the slot with `Abandoned` if the job is dropped without running.
struct Completer<T> {
    slot: Arc<Slot<T>>,
    filled: bool,
}

impl<T> Completer<T> {
    fn complete(mut self, value: Result<T, PoolError>) {
        self.slot.fill(value);
        self.filled = true;
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if !self.filled {
            self.slot.fill(Err(PoolError::Abandoned));
        }
    }
}

/// Handle to the eventual result of a submitted task.
pub struct TaskHandle<T> {
    slot: Arc<Slot<T>>,
}

impl<T> TaskHandle<T> {
    /// Block until the task has finished (or been abandoned) and take its result.
    pub fn join(self) -> Result<T, PoolError> {
        let mut result = self.slot.wait();
        result.take().unwrap_or(Err(PoolError::Abandoned))
    }

    /// Whether the task has finished or been abandoned.
    pub fn is_finished(&self) -> bool {
        self.slot.result.lock().is_some()
    }
}

/// A fixed pool of worker threads with a quiescence barrier.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    outstanding: Mutex<Vec<Arc<dyn Outstanding>>>,
}

impl WorkerPool {
    /// Spawn a pool with `threads` workers (at least one).
    pub fn new(threads: usize) -> io::Result<Self> {
        let threads = threads.max(1);
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                active: 0,
                stop: false,
            }),
            available: Condvar::new(),
        });

        let mut workers = Vec::with_capacity(threads);
        for i in 0..threads {
            let shared = Arc::clone(&shared);
            let handle = thread::Builder::new()
                .name(format!("weld-worker-{}", i))
                .spawn(move || worker_loop(&shared))?;
            workers.push(handle);
        }

        tracing::debug!("started worker pool with {} threads", threads);

        Ok(WorkerPool {
            shared,
            workers,
            outstanding: Mutex::new(Vec::new()),
        })
    }

    /// A pool sized to the available hardware parallelism.
    pub fn with_available_parallelism() -> io::Result<Self> {
        Self::new(default_parallelism())
    }

    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Enqueue a task and return immediately.
    pub fn submit<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let slot = Arc::new(Slot::new());
        let completer = Completer {
            slot: Arc::clone(&slot),
            filled: false,
        };
        let shared = Arc::clone(&self.shared);

        let job: Job = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(task)).map_err(|payload| {
                PoolError::Panicked {
                    message: panic_message(payload.as_ref()),
                }
            });
            // A finished handle implies the task is no longer counted as active.
            shared.finish_one();
            completer.complete(outcome);
        });

        self.outstanding.lock().push(slot.clone() as Arc<dyn Outstanding>);
        self.shared.state.lock().jobs.push_back(job);
        self.shared.available.notify_one();

        TaskHandle { slot }
    }

    /// Block until every task submitted so far has finished.
    pub fn barrier(&self) {
        loop {
            let pending: Vec<_> = std::mem::take(&mut *self.outstanding.lock());
            if pending.is_empty() {
                return;
            }
            for slot in pending {
                slot.wait_done();
            }
        }
    }

    /// Number of tasks waiting in the queue.
    pub fn queued_len(&self) -> usize {
        self.shared.state.lock().jobs.len()
    }

    /// Number of tasks currently executing.
    pub fn active_count(&self) -> usize {
        self.shared.state.lock().active
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        let abandoned: Vec<Job> = {
            let mut state = self.shared.state.lock();
            state.stop = true;
            state.jobs.drain(..).collect()
        };
        if !abandoned.is_empty() {
            tracing::debug!("abandoning {} queued task(s)", abandoned.len());
        }
        drop(abandoned);

        self.shared.available.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let job = {
            let mut state = shared.state.lock();
            loop {
                if state.stop {
                    return;
                }
                if let Some(job) = state.jobs.pop_front() {
                    state.active += 1;
                    break job;
                }
                shared.available.wait(&mut state);
            }
        };
        job();
    }
}

/// Hardware parallelism, falling back to a single worker.
pub fn default_parallelism() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
