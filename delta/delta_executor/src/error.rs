//! Error types for the executor.
//!
//! Misuse of the process-wide handle is reported through [`ExecutorError`].
//! Failures raised by individual tasks never cross the executor boundary; they
//! are captured as [`TaskFailure`](crate::task::TaskFailure) and logged.

use thiserror::Error;

use crate::pool::ThreadPoolError;

/// Errors surfaced to the host by the executor.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// `initialize` was called while an executor already exists
    #[error("an executor instance already exists")]
    AlreadyInitialized,

    /// `instance` was called before `initialize`
    #[error("the executor has not been initialized yet")]
    NotInitialized,

    /// The worker pool could not be constructed
    #[error("worker pool error: {0}")]
    Pool(#[from] ThreadPoolError),
}

/// Result type for executor operations.
pub type Result<T> = std::result::Result<T, ExecutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_error_converts() {
        let err: ExecutorError = ThreadPoolError::InvalidSize { core: 4, max: 2 }.into();
        assert!(matches!(err, ExecutorError::Pool(_)));
        assert!(err.to_string().contains("core 4"));
    }
}
