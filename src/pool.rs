use super::{
    errors::SpawnError,
    result::SpawnResult,
    handle::{
        channel,
        Task,
        JoinHandle,
    },
    model::PoolMetrics,
    queue::TaskQueue,
};
use std::{
    mem,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, info, trace, warn};


const MAX_THREADS: usize = 1024;

/// Thread pool configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub num_threads: usize,
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            thread_name_prefix: "thread-ext-worker".to_string(),
            stack_size: None,
        }
    }
}

impl Config {
    pub fn cpu_bound() -> Self {
        Self {
            num_threads: num_cpus::get(),
            ..Default::default()
        }
    }

    /// Twice the CPU count. Blocking tasks and scheduled tasks both hold a
    /// worker while they wait, so extra threads keep the pool responsive.
    pub fn io_bound() -> Self {
        Self {
            num_threads: num_cpus::get() * 2,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> SpawnResult<()> {
        if self.num_threads == 0 {
            return Err(SpawnError::config("num_threads must be > 0"));
        }
        if self.num_threads > MAX_THREADS {
            return Err(SpawnError::config(format!(
                "num_threads too large (max {})",
                MAX_THREADS
            )));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(SpawnError::config("thread_name_prefix must not be empty"));
        }
        Ok(())
    }
}


#[derive(Default)]
struct Counters {
    active: AtomicUsize,
    submitted: AtomicUsize,
    rejected: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// Fixed-size pool of OS worker threads.
///
/// Workers pull tasks from one shared FIFO queue. Tasks submitted with
/// [`ThreadPool::schedule`] sleep on the worker that picked them up, so many
/// long delays at once can occupy every worker and stall immediate work.
///
/// [`ThreadPool::shutdown`] stops the workers without draining the queue:
/// tasks that have not started yet are abandoned and their handles stay
/// pending until the pool is dropped.
pub struct ThreadPool {
    queue: Arc<TaskQueue>,
    counters: Arc<Counters>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
    num_threads: usize,
}

impl ThreadPool {
    /// Spawns `num_threads` workers right away. The count is not validated;
    /// a pool with zero workers accepts tasks but never runs them.
    pub fn new(num_threads: usize) -> SpawnResult<Self> {
        let config = Config {
            num_threads,
            ..Default::default()
        };
        Self::spawn(config)
    }

    pub fn with_config(config: Config) -> SpawnResult<Self> {
        config.validate()?;
        Self::spawn(config)
    }

    fn spawn(config: Config) -> SpawnResult<Self> {
        let queue = Arc::new(TaskQueue::new());
        let counters = Arc::new(Counters::default());
        let mut workers = Vec::with_capacity(config.num_threads);

        for index in 0..config.num_threads {
            let mut builder = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name_prefix, index));
            if let Some(size) = config.stack_size {
                builder = builder.stack_size(size);
            }

            let queue_clone = queue.clone();
            match builder.spawn(move || worker_loop(index, &queue_clone)) {
                Ok(worker) => workers.push(worker),
                Err(err) => {
                    queue.close();
                    for worker in workers {
                        let _ = worker.join();
                    }
                    return Err(SpawnError::WorkerSpawn(err.to_string()));
                }
            }
        }

        debug!(num_threads = config.num_threads, "thread pool started");

        Ok(Self {
            queue,
            counters,
            workers: Mutex::new(workers),
            num_threads: config.num_threads,
        })
    }

    #[inline]
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Queues `task` for execution and returns a handle to its result.
    ///
    /// Fails with [`SpawnError::Rejected`] once the pool is shut down; the
    /// task is dropped without running.
    pub fn submit<T, F>(&self, task: F) -> SpawnResult<JoinHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.enqueue(task, None)
    }

    /// Like [`ThreadPool::submit`], but the task does not start before
    /// `delay` has passed since this call.
    ///
    /// The task is queued immediately. The worker that dequeues it sleeps
    /// until the deadline, and stays unavailable to other work meanwhile.
    pub fn schedule<T, F>(&self, task: F, delay: Duration) -> SpawnResult<JoinHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.enqueue(task, Some(delay))
    }

    fn enqueue<T, F>(&self, task: F, delay: Option<Duration>) -> SpawnResult<JoinHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, handle) = channel::<T>();
        let counters = self.counters.clone();
        // Deadline is fixed at submission, not at dequeue.
        let wake_at = delay.map(|d| (Instant::now().checked_add(d), d));

        let job: Task = Box::new(move || {
            counters.active.fetch_add(1, Ordering::Relaxed);
            if let Some((deadline, delay)) = wake_at {
                sleep_until(deadline, delay);
            }

            let result = panic::catch_unwind(AssertUnwindSafe(task))
                .map_err(SpawnError::from_panic);
            counters.active.fetch_sub(1, Ordering::Relaxed);

            match &result {
                Ok(_) => {
                    counters.completed.fetch_add(1, Ordering::Relaxed);
                }
                Err(err) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(error = %err, "task failed");
                }
            }
            tx.send(result);
        });

        match self.queue.push(job) {
            Ok(()) => {
                self.counters.submitted.fetch_add(1, Ordering::Relaxed);
                trace!(delay_ms = delay.map(|d| d.as_millis() as u64), "task queued");
                Ok(handle)
            }
            Err(_rejected) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                debug!("task rejected, pool is shut down");
                Err(SpawnError::Rejected)
            }
        }
    }

    /// Stops accepting work, wakes every worker and waits for them to exit.
    ///
    /// Workers finish the task they are running but do not drain the queue.
    /// Calling this again is a no-op.
    pub fn shutdown(&self) {
        if !self.queue.close() {
            return;
        }

        let abandoned = self.queue.len();
        let workers = mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );

        // A task holding the last reference may drop the pool from a worker.
        let current = thread::current().id();
        for worker in workers {
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                warn!("worker thread panicked");
            }
        }

        info!(abandoned, "thread pool shut down");
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        !self.queue.is_active()
    }

    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            num_threads: self.num_threads,
            active_tasks: self.counters.active.load(Ordering::Relaxed),
            queued_tasks: self.queue.len(),
            total_submitted: self.counters.submitted.load(Ordering::Relaxed),
            rejected_tasks: self.counters.rejected.load(Ordering::Relaxed),
            completed_tasks: self.counters.completed.load(Ordering::Relaxed),
            failed_tasks: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("num_threads", &self.num_threads)
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}


fn worker_loop(index: usize, queue: &TaskQueue) {
    debug!(worker = index, "worker started");
    while let Some(task) = queue.pop_blocking() {
        trace!(worker = index, "task dequeued");
        task();
    }
    debug!(worker = index, "worker exiting");
}

fn sleep_until(deadline: Option<Instant>, delay: Duration) {
    match deadline {
        Some(deadline) => {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if !remaining.is_zero() {
                thread::sleep(remaining);
            }
        }
        // Deadline overflowed Instant; sleep the full delay instead.
        None => thread::sleep(delay),
    }
}
