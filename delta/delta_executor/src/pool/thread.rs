//! Thread pool implementation for parallel execution.
//!
//! A bounded set of worker threads draining an unbounded queue. Workers are
//! spawned on demand: always while fewer than `core_threads` are alive, and
//! beyond that, up to `max_threads`, while the backlog outgrows the idle
//! workers. Workers above the core size exit after `idle_timeout` without work.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, trace, warn};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::task::guard::panic_message;

/// A closure queued on the pool
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Errors reported by the thread pool
#[derive(Error, Debug)]
pub enum ThreadPoolError {
    /// The thread pool is shutting down
    #[error("thread pool is shutting down")]
    ShuttingDown,

    /// The requested sizes cannot form a pool
    #[error("invalid pool size: core {core}, max {max}")]
    InvalidSize {
        /// Requested core size
        core: usize,
        /// Requested maximum size
        max: usize,
    },

    /// No worker could be started to run the task
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// A wait for termination was interrupted
    #[error("wait for termination was interrupted")]
    Interrupted,
}

/// Statistics about the thread pool
#[derive(Debug, Default, Clone)]
pub struct ThreadPoolStats {
    /// Number of tasks queued
    pub tasks_queued: usize,

    /// Number of tasks completed
    pub tasks_completed: usize,

    /// Number of tasks that panicked
    pub tasks_panicked: usize,

    /// Total task execution time (microseconds)
    pub total_execution_time_us: u64,

    /// Queue wait time (microseconds)
    pub total_queue_time_us: u64,

    /// Maximum task execution time (microseconds)
    pub max_execution_time_us: u64,
}

/// Configuration for the thread pool
#[derive(Debug, Clone)]
pub struct ThreadPoolConfig {
    /// Number of workers kept alive even when idle
    pub core_threads: usize,

    /// Maximum number of worker threads
    pub max_threads: usize,

    /// How long a worker above the core size may idle before exiting
    pub idle_timeout: Duration,

    /// Name prefix for worker threads
    pub thread_name_prefix: String,

    /// Whether to collect performance statistics
    pub collect_stats: bool,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        let cpus = num_cpus::get();
        Self {
            core_threads: cpus,
            max_threads: cpus,
            idle_timeout: Duration::from_secs(60),
            thread_name_prefix: "delta-worker".to_string(),
            collect_stats: true,
        }
    }
}

/// Job with metadata for tracking
struct QueuedJob {
    /// The closure to execute
    func: Job,

    /// When the job was enqueued
    enqueued_at: Instant,
}

impl QueuedJob {
    fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            func: Box::new(f),
            enqueued_at: Instant::now(),
        }
    }
}

/// Worker bookkeeping. A worker counts as idle whenever it is not running a job.
#[derive(Debug, Default)]
struct WorkerState {
    live: usize,
    idle: usize,
    next_id: usize,
}

#[derive(Debug, Default)]
struct StatsCounters {
    tasks_queued: AtomicUsize,
    tasks_completed: AtomicUsize,
    tasks_panicked: AtomicUsize,
    total_execution_time_us: AtomicUsize,
    total_queue_time_us: AtomicUsize,
    max_execution_time_us: AtomicUsize,
}

/// State shared between the pool handle and its workers
struct PoolShared {
    receiver: Receiver<QueuedJob>,
    state: Mutex<WorkerState>,
    /// Signalled whenever a worker exits or a waiter is interrupted
    terminated: Condvar,
    shutdown: AtomicBool,
    stopped: AtomicBool,
    interrupted: AtomicBool,
    config: ThreadPoolConfig,
    stats: StatsCounters,
}

impl PoolShared {
    fn is_terminated(&self, state: &WorkerState) -> bool {
        self.shutdown.load(Ordering::SeqCst) && state.live == 0 && self.receiver.is_empty()
    }

    fn worker_exited(&self, id: usize) {
        let mut state = self.state.lock();
        state.live -= 1;
        state.idle -= 1;
        self.terminated.notify_all();
        debug!("Worker {}: Shutting down ({} still alive)", id, state.live);
    }

    fn run_job(&self, id: usize, job: QueuedJob) {
        let queue_time = job.enqueued_at.elapsed();
        let collect_stats = self.config.collect_stats;

        if collect_stats {
            self.stats
                .total_queue_time_us
                .fetch_add(queue_time.as_micros() as usize, Ordering::Relaxed);
        }

        trace!(
            "Worker {}: Executing job (queue time: {:.2}ms)",
            id,
            queue_time.as_micros() as f64 / 1000.0
        );

        let exec_start = Instant::now();

        // Jobs are expected to contain their own failures; this is the backstop
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(job.func));

        let exec_time = exec_start.elapsed();

        if collect_stats {
            let exec_time_us = exec_time.as_micros() as usize;
            self.stats
                .total_execution_time_us
                .fetch_add(exec_time_us, Ordering::Relaxed);
            self.stats
                .max_execution_time_us
                .fetch_max(exec_time_us, Ordering::Relaxed);
        }

        match result {
            Ok(()) => {
                trace!(
                    "Worker {}: Job completed in {:.2}ms",
                    id,
                    exec_time.as_micros() as f64 / 1000.0
                );

                if collect_stats {
                    self.stats.tasks_completed.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(e) => {
                error!(
                    "Worker {}: Job panicked: {}",
                    id,
                    panic_message(e.as_ref())
                );

                if collect_stats {
                    self.stats.tasks_panicked.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}

/// A bounded pool of worker threads with an unbounded queue
pub struct ThreadPool {
    /// Sending half of the queue; taken on shutdown to close it
    sender: Mutex<Option<Sender<QueuedJob>>>,

    shared: Arc<PoolShared>,
}

impl ThreadPool {
    /// Create a pool with a fixed number of workers
    pub fn new(threads: usize) -> Result<Self, ThreadPoolError> {
        let config = ThreadPoolConfig {
            core_threads: threads,
            max_threads: threads,
            ..Default::default()
        };
        Self::with_config(config)
    }

    /// Create a new thread pool with the specified configuration.
    ///
    /// No worker is started until the first job is submitted.
    pub fn with_config(config: ThreadPoolConfig) -> Result<Self, ThreadPoolError> {
        if config.max_threads == 0 || config.core_threads > config.max_threads {
            return Err(ThreadPoolError::InvalidSize {
                core: config.core_threads,
                max: config.max_threads,
            });
        }

        let (sender, receiver) = unbounded();

        info!(
            "Creating thread pool with {} core and {} max workers",
            config.core_threads, config.max_threads
        );

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            shared: Arc::new(PoolShared {
                receiver,
                state: Mutex::new(WorkerState::default()),
                terminated: Condvar::new(),
                shutdown: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                interrupted: AtomicBool::new(false),
                config,
                stats: StatsCounters::default(),
            }),
        })
    }

    /// Worker thread main loop
    fn worker_loop(id: usize, shared: Arc<PoolShared>) {
        debug!("Worker {}: Starting", id);

        while !shared.stopped.load(Ordering::SeqCst) {
            let above_core = shared.state.lock().live > shared.config.core_threads;

            let received = if above_core {
                shared.receiver.recv_timeout(shared.config.idle_timeout)
            } else {
                shared
                    .receiver
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected)
            };

            match received {
                Ok(job) => {
                    shared.state.lock().idle -= 1;
                    shared.run_job(id, job);
                    shared.state.lock().idle += 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    let mut state = shared.state.lock();
                    // A submitter may have counted on this worker being idle
                    if state.live > shared.config.core_threads && shared.receiver.is_empty() {
                        state.live -= 1;
                        state.idle -= 1;
                        shared.terminated.notify_all();
                        debug!("Worker {}: Idle timeout, retiring", id);
                        return;
                    }
                }
                // Queue closed and drained
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        shared.worker_exited(id);
    }

    /// Start a worker if the pool is below its core size, or if the backlog
    /// has outgrown the idle workers and the pool is below its maximum.
    fn ensure_worker(&self) -> Result<(), ThreadPoolError> {
        let config = &self.shared.config;
        let mut state = self.shared.state.lock();

        let backlog = self.shared.receiver.len();
        let wanted = state.live < config.core_threads
            || (backlog >= state.idle && state.live < config.max_threads);

        if !wanted {
            return Ok(());
        }

        self.spawn_worker(&mut state)
    }

    /// Start one worker. Called with the state lock held.
    fn spawn_worker(&self, state: &mut WorkerState) -> Result<(), ThreadPoolError> {
        let config = &self.shared.config;
        let id = state.next_id;
        state.next_id += 1;
        state.live += 1;
        state.idle += 1;

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(format!("{}-{}", config.thread_name_prefix, id))
            .spawn(move || Self::worker_loop(id, shared));

        match spawned {
            Ok(_) => Ok(()),
            Err(e) => {
                state.live -= 1;
                state.idle -= 1;

                if state.live == 0 {
                    error!("Failed to spawn worker {} and none are alive: {}", id, e);
                    Err(ThreadPoolError::Spawn(e))
                } else {
                    warn!(
                        "Failed to spawn worker {}, continuing with {}: {}",
                        id, state.live, e
                    );
                    Ok(())
                }
            }
        }
    }

    /// Submit a job to be executed by the thread pool
    pub fn execute<F>(&self, f: F) -> Result<(), ThreadPoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.lock();
        let sender = sender.as_ref().ok_or(ThreadPoolError::ShuttingDown)?;

        self.ensure_worker()?;

        sender
            .send(QueuedJob::new(f))
            .map_err(|_| ThreadPoolError::ShuttingDown)?;

        // The last worker may have retired between ensure_worker and the send
        {
            let mut state = self.shared.state.lock();
            if state.live == 0 && self.spawn_worker(&mut state).is_err() {
                warn!("Job queued with no live worker; it runs on forced shutdown");
            }
        }

        if self.shared.config.collect_stats {
            self.shared
                .stats
                .tasks_queued
                .fetch_add(1, Ordering::Relaxed);
        }

        Ok(())
    }

    /// Get current statistics for the thread pool
    pub fn get_stats(&self) -> ThreadPoolStats {
        if !self.shared.config.collect_stats {
            return ThreadPoolStats::default();
        }

        let stats = &self.shared.stats;
        ThreadPoolStats {
            tasks_queued: stats.tasks_queued.load(Ordering::Relaxed),
            tasks_completed: stats.tasks_completed.load(Ordering::Relaxed),
            tasks_panicked: stats.tasks_panicked.load(Ordering::Relaxed),
            total_execution_time_us: stats.total_execution_time_us.load(Ordering::Relaxed) as u64,
            total_queue_time_us: stats.total_queue_time_us.load(Ordering::Relaxed) as u64,
            max_execution_time_us: stats.max_execution_time_us.load(Ordering::Relaxed) as u64,
        }
    }

    /// Stop accepting jobs. Already queued jobs still run.
    pub fn shutdown(&self) {
        if self.shared.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("Shutting down thread pool");

        // Dropping the sender closes the channel; workers exit once it drains
        self.sender.lock().take();
    }

    /// Stop accepting jobs, stop workers from taking more, and return the
    /// backlog in queue order.
    ///
    /// Jobs already running are left to finish on their own.
    pub fn shutdown_now(&self) -> Vec<Job> {
        info!("Stopping thread pool");

        self.shared.stopped.store(true, Ordering::SeqCst);
        self.shutdown();

        let backlog: Vec<Job> = self.shared.receiver.try_iter().map(|job| job.func).collect();

        let _state = self.shared.state.lock();
        self.shared.terminated.notify_all();

        debug!("Reclaimed {} queued jobs", backlog.len());
        backlog
    }

    /// Block until the pool has shut down and every worker has exited, or
    /// until `timeout` elapses.
    ///
    /// Returns `Ok(true)` on termination, `Ok(false)` on timeout, and
    /// `Err(ThreadPoolError::Interrupted)` if [`interrupt`](Self::interrupt)
    /// was called before or during the wait.
    pub fn await_termination(&self, timeout: Duration) -> Result<bool, ThreadPoolError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();

        loop {
            if self.shared.interrupted.swap(false, Ordering::SeqCst) {
                return Err(ThreadPoolError::Interrupted);
            }

            if self.shared.is_terminated(&state) {
                return Ok(true);
            }

            if self
                .shared
                .terminated
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                if self.shared.interrupted.swap(false, Ordering::SeqCst) {
                    return Err(ThreadPoolError::Interrupted);
                }
                return Ok(self.shared.is_terminated(&state));
            }
        }
    }

    /// Interrupt the current (or next) call to
    /// [`await_termination`](Self::await_termination)
    pub fn interrupt(&self) {
        self.shared.interrupted.store(true, Ordering::SeqCst);

        let _state = self.shared.state.lock();
        self.shared.terminated.notify_all();
    }

    /// Get the number of live worker threads
    pub fn worker_count(&self) -> usize {
        self.shared.state.lock().live
    }

    /// Number of jobs waiting in the queue
    pub fn queued_count(&self) -> usize {
        self.shared.receiver.len()
    }

    /// Check if the thread pool is shutting down
    pub fn is_shutdown(&self) -> bool {
        self.shared.shutdown.load(Ordering::SeqCst)
    }

    /// Whether the pool has shut down and all workers have exited
    pub fn is_terminated(&self) -> bool {
        let state = self.shared.state.lock();
        self.shared.is_terminated(&state)
    }

    /// The pool's configuration
    pub fn config(&self) -> &ThreadPoolConfig {
        &self.shared.config
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if !self.is_shutdown() {
            self.shutdown();
        }

        debug!("Thread pool dropped - workers will exit once the queue drains");
    }
}
