//! Task submission, cancellation and shutdown.
//!
//! The executor registers every submitted action as a task before anything
//! can run or cancel it, then either queues the task's id on the worker pool
//! or, once shutdown has begun, runs it on the caller's thread.

pub mod global;
mod runner;
mod shutdown;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ExecutorConfig;
use crate::error::Result;
use crate::logging::{ExecutorLog, Logger};
use crate::pool::{ThreadPool, ThreadPoolStats};
use crate::registry::TaskRegistry;
use crate::task::{Action, Task, TaskId, TaskStatus};

use runner::TaskRunner;
pub use shutdown::ShutdownOutcome;

/// Result of a cancellation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancelResult {
    /// The task was waiting and will never run
    Cancelled,

    /// The task could not be cancelled: it is running, or it was already cancelled
    Running,

    /// No such task: it never existed or has already finished
    NotFound,
}

impl fmt::Display for CancelResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cancelled => "Cancelled",
            Self::Running => "Running",
            Self::NotFound => "NotFound",
        };
        f.write_str(name)
    }
}

/// Managed task executor
pub struct Executor {
    config: ExecutorConfig,

    /// Flips to false exactly once, when shutdown begins
    accepting_new_tasks: AtomicBool,

    runner: TaskRunner,

    pool: ThreadPool,
}

impl Executor {
    /// Create an executor logging to `logger`.
    ///
    /// Fails only if the pool sizes are unusable.
    pub fn new(config: ExecutorConfig, logger: Arc<dyn Logger>) -> Result<Self> {
        let pool = ThreadPool::with_config(config.pool_config())?;
        let log = Arc::new(ExecutorLog::new(logger, config.debug));

        log.info(&format!(
            "Creating executor with {}..{} workers and {} nice shutdown passes",
            config.core_thread_count, config.max_thread_count, config.nice_shutdown_passes
        ));

        Ok(Self {
            runner: TaskRunner::new(TaskRegistry::new(), log),
            accepting_new_tasks: AtomicBool::new(true),
            pool,
            config,
        })
    }

    /// The configuration this executor was built with
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Whether debug logging is enabled
    pub fn is_debug_enabled(&self) -> bool {
        self.runner.log.is_debug_enabled()
    }

    /// Toggle debug logging. Has no other effect.
    pub fn set_debug_enabled(&self, enabled: bool) {
        self.runner.log.set_debug_enabled(enabled);
    }

    /// Whether submissions are queued (`true`) or run inline (`false`)
    pub fn is_accepting_new_tasks(&self) -> bool {
        self.accepting_new_tasks.load(Ordering::SeqCst)
    }

    /// Submit an action and return its id.
    ///
    /// While the executor is accepting new tasks the action runs on a worker;
    /// afterwards it runs on the calling thread before this returns.
    pub fn execute<F>(&self, action: F) -> TaskId
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Box::new(move || -> anyhow::Result<()> {
            action();
            Ok(())
        }))
    }

    /// Submit an action that may fail. A returned error is logged with the
    /// task's id and otherwise treated like a panic: contained.
    pub fn execute_fallible<F, E>(&self, action: F) -> TaskId
    where
        F: FnOnce() -> std::result::Result<(), E> + Send + 'static,
        E: Into<anyhow::Error>,
    {
        self.submit(Box::new(move || -> anyhow::Result<()> {
            action().map_err(Into::into)
        }))
    }

    fn submit(&self, action: Action) -> TaskId {
        // Registered before it can possibly run or be cancelled
        let id = self.runner.registry.insert(Task::new(action)).id();
        self.runner.log.debug(|| format!("Queued task {}", id));

        if self.is_accepting_new_tasks() {
            let runner = self.runner.clone();
            match self.pool.execute(move || runner.run(id)) {
                Ok(()) => return id,
                // Shutdown began after the check above
                Err(e) => self
                    .runner
                    .log
                    .debug(|| format!("Task {} not queued ({}), running it inline", id, e)),
            }
        }

        self.runner.run(id);
        id
    }

    /// Try to cancel a task.
    ///
    /// Only a task that no worker has claimed yet can be cancelled. A running
    /// action is never interrupted.
    pub fn cancel(&self, id: TaskId) -> CancelResult {
        match self.runner.registry.get(id) {
            Some(task) if task.try_mark_cancelled() => {
                self.runner
                    .log
                    .debug(|| format!("Task {} has been cancelled.", id));
                CancelResult::Cancelled
            }
            Some(_) => {
                self.runner
                    .log
                    .debug(|| format!("Task {} could not be cancelled.", id));
                CancelResult::Running
            }
            None => {
                self.runner
                    .log
                    .debug(|| format!("Task {} was not found during an attempt to cancel it.", id));
                CancelResult::NotFound
            }
        }
    }

    /// Status of a registered task, or `None` once it has finished
    pub fn task_status(&self, id: TaskId) -> Option<TaskStatus> {
        self.runner.registry.get(id).map(|task| task.status())
    }

    /// Number of registered tasks: queued, running, or cancelled but not yet cleaned up
    pub fn pending_tasks(&self) -> usize {
        self.runner.registry.len()
    }

    /// Live worker threads
    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Worker pool statistics
    pub fn pool_stats(&self) -> ThreadPoolStats {
        self.pool.get_stats()
    }

    /// Shut the executor down.
    ///
    /// Waits up to `nice_shutdown_passes` passes for queued and running tasks
    /// to finish. If they don't, or the wait is interrupted, the pool is
    /// stopped and every task still queued runs on this thread. From the
    /// moment this is called, new submissions run inline.
    ///
    /// Calling it again is a no-op. It never fails.
    pub fn shutdown(&self) -> ShutdownOutcome {
        if !self.accepting_new_tasks.swap(false, Ordering::SeqCst) {
            return ShutdownOutcome::AlreadyShutDown;
        }

        let log = &self.runner.log;
        log.info("Shutting down executor ...");

        self.pool.shutdown();

        let nicely = shutdown::shutdown_nicely(
            &self.pool,
            &self.runner.registry,
            log,
            self.config.nice_shutdown_passes,
            self.config.nice_shutdown_interval(),
        );

        let outcome = match nicely {
            Ok(true) => ShutdownOutcome::Nice,
            Ok(false) => ShutdownOutcome::Forced {
                reclaimed: shutdown::shutdown_forcibly(&self.pool, log),
            },
            Err(e) => {
                log.error(&format!("Waiting for tasks failed: {}", e));
                ShutdownOutcome::Forced {
                    reclaimed: shutdown::shutdown_forcibly(&self.pool, log),
                }
            }
        };

        log.info("All tasks executed from this point on will be run synchronously.");
        outcome
    }

    /// Abort the nice phase of an in-progress [`shutdown`](Self::shutdown)
    /// and move on to forced reclamation.
    ///
    /// Does nothing while the executor is still accepting tasks.
    pub fn interrupt_shutdown(&self) {
        if !self.is_accepting_new_tasks() {
            self.pool.interrupt();
        }
    }
}
