#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

//! # Delta Executor
//!
//! A managed task executor for running units of work off the calling thread.
//!
//! Every submitted action is wrapped in a [`task::Task`] with a process-unique,
//! monotonically increasing [`TaskId`]. The id can be used to cancel the task
//! for as long as no worker has started running it.
//!
//! The executor degrades gracefully: once [`Executor::shutdown`] has begun,
//! submissions are no longer queued but run synchronously on the caller's
//! thread. Shutdown itself happens in two phases:
//!
//! - **Nice**: wait in 30 second passes for queued and running work to finish.
//! - **Forced**: stop the workers and replay whatever is still queued on the
//!   shutting-down thread, isolating each task's failure.
//!
//! ```no_run
//! use delta_executor::{CancelResult, Executor, ExecutorConfig, LogFacade};
//! use std::sync::Arc;
//!
//! let executor = Executor::new(ExecutorConfig::default(), Arc::new(LogFacade::new("delta")))
//!     .expect("valid pool size");
//!
//! let id = executor.execute(|| println!("hello from a worker"));
//! if executor.cancel(id) == CancelResult::Cancelled {
//!     println!("cancelled {}", id);
//! }
//!
//! executor.shutdown();
//! ```

/// Configuration for the executor and its worker pool
pub mod config;

/// Error types for the executor and its worker pool
pub mod error;

/// Task submission, cancellation and the two-phase shutdown protocol
pub mod executor;

/// Logging sink abstraction and debug-gated logging helpers
pub mod logging;

/// Bounded worker pool draining an unbounded queue
pub mod pool;

/// Concurrent registry of in-flight tasks
pub mod registry;

/// Task identity, status state machine and guarded invocation
pub mod task;

pub use config::ExecutorConfig;
pub use error::{ExecutorError, Result};
pub use executor::{global, CancelResult, Executor, ShutdownOutcome};
pub use logging::{LogFacade, Logger};
pub use pool::{ThreadPool, ThreadPoolConfig, ThreadPoolError, ThreadPoolStats};
pub use task::{TaskFailure, TaskId, TaskStatus};
