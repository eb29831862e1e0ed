//! Guarded invocation of user actions.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

use super::Action;

/// A failure raised by a task's action.
#[derive(Debug, Error)]
pub enum TaskFailure {
    /// The action panicked
    #[error("panicked: {0}")]
    Panicked(String),

    /// The action returned an error
    #[error("failed: {0:#}")]
    Failed(anyhow::Error),
}

/// Run `action`, capturing a panic or a returned error instead of propagating it.
pub fn run_guarded(action: Action) -> Result<(), TaskFailure> {
    match panic::catch_unwind(AssertUnwindSafe(action)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(TaskFailure::Failed(e)),
        Err(payload) => Err(TaskFailure::Panicked(panic_message(payload.as_ref()))),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<unknown panic>".to_string()
    }
}
