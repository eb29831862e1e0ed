//! Process-wide executor handle.
//!
//! Hosts that cannot thread an [`Executor`] through their call graph may
//! install one here at startup. Initializing twice, or asking for the instance
//! before initializing, is a bootstrap ordering bug and is reported as an error.

use once_cell::sync::OnceCell;
use std::sync::Arc;

use super::Executor;
use crate::config::ExecutorConfig;
use crate::error::{ExecutorError, Result};
use crate::logging::Logger;

static INSTANCE: OnceCell<Executor> = OnceCell::new();

/// Construct the process-wide executor.
///
/// Fails with [`ExecutorError::AlreadyInitialized`] if one already exists.
pub fn initialize(config: ExecutorConfig, logger: Arc<dyn Logger>) -> Result<&'static Executor> {
    if INSTANCE.get().is_some() {
        return Err(ExecutorError::AlreadyInitialized);
    }

    let executor = Executor::new(config, logger)?;

    // A racing initializer may have won since the check above
    INSTANCE
        .set(executor)
        .map_err(|_| ExecutorError::AlreadyInitialized)?;

    instance()
}

/// The process-wide executor.
///
/// Fails with [`ExecutorError::NotInitialized`] before [`initialize`].
pub fn instance() -> Result<&'static Executor> {
    INSTANCE.get().ok_or(ExecutorError::NotInitialized)
}

/// Whether [`initialize`] has completed
pub fn is_initialized() -> bool {
    INSTANCE.get().is_some()
}
