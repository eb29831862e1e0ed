//! Worker pool for running submitted work off the calling thread.
//!
//! The pool owns no task state. It only runs closures handed to it, and on a
//! forced stop it hands back whatever it had not started yet.

pub mod thread;

// Re-export key types from thread
pub use thread::{Job, ThreadPool, ThreadPoolConfig, ThreadPoolError, ThreadPoolStats};
