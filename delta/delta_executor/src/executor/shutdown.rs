//! Two-phase shutdown.
//!
//! Phase A waits, pass by pass, for the pool to drain on its own. Phase B
//! stops the pool and replays its backlog on the shutting-down thread.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use crate::logging::ExecutorLog;
use crate::pool::{ThreadPool, ThreadPoolError};
use crate::registry::TaskRegistry;
use crate::task::guard::panic_message;

/// How a call to [`Executor::shutdown`](crate::Executor::shutdown) ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The executor was already shut down; nothing was done
    AlreadyShutDown,

    /// Every queued and running task finished within the waiting passes
    Nice,

    /// The waiting passes ran out or were interrupted; `reclaimed` queued
    /// tasks were run on the shutting-down thread
    Forced {
        /// Number of tasks taken back from the pool's queue
        reclaimed: usize,
    },
}

/// Wait up to `passes` times `interval` for the pool to terminate.
///
/// Returns `Ok(true)` as soon as it does, `Ok(false)` once the passes are
/// exhausted, and the pool's error if a wait is interrupted.
pub(crate) fn shutdown_nicely(
    pool: &ThreadPool,
    registry: &TaskRegistry,
    log: &ExecutorLog,
    passes: u32,
    interval: Duration,
) -> Result<bool, ThreadPoolError> {
    for pass in 1..=passes {
        log.info(&format!(
            "(Pass {} of {}) Waiting {} seconds for all tasks to complete ...",
            pass,
            passes,
            interval.as_secs()
        ));

        if pool.await_termination(interval)? {
            log.info("Executor has been shut down nicely.");
            return Ok(true);
        }

        log.info(&format!("Tasks Remaining: {}", registry.len()));
    }

    Ok(false)
}

/// Stop the pool and run every job still in its queue on this thread.
///
/// Each job is isolated: a panic is logged and the next job still runs.
/// Returns the number of reclaimed jobs.
pub(crate) fn shutdown_forcibly(pool: &ThreadPool, log: &ExecutorLog) -> usize {
    log.info("Failed to shut down nicely. Shutting down forcibly ...");

    let backlog = pool.shutdown_now();
    let reclaimed = backlog.len();

    for job in backlog {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            log.error(&format!(
                "Reclaimed job panicked: {}",
                panic_message(payload.as_ref())
            ));
        }
    }

    log.info(&format!(
        "Executor has been shut down forcibly ({} queued tasks run inline).",
        reclaimed
    ));
    reclaimed
}
