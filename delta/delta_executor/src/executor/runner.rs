//! The per-task run routine.
//!
//! Whatever path a task takes (a worker, the submitting thread, or forced
//! reclamation during shutdown) it ends up here, identified only by its id.

use std::sync::Arc;

use crate::logging::ExecutorLog;
use crate::registry::TaskRegistry;
use crate::task::{run_guarded, TaskId};

/// Runs registered tasks by id.
#[derive(Clone)]
pub(crate) struct TaskRunner {
    pub(crate) registry: TaskRegistry,
    pub(crate) log: Arc<ExecutorLog>,
}

impl TaskRunner {
    pub(crate) fn new(registry: TaskRegistry, log: Arc<ExecutorLog>) -> Self {
        Self { registry, log }
    }

    /// Claim, run and deregister the task with the given id.
    ///
    /// A cancelled task is skipped. A failing task is logged. Either way the
    /// task leaves the registry when this returns.
    pub(crate) fn run(&self, id: TaskId) {
        let Some(task) = self.registry.get(id) else {
            self.log.error(&format!(
                "Task {} not found. Was it submitted through Executor::execute?",
                id
            ));
            return;
        };

        if task.try_mark_running() {
            if let Some(action) = task.take_action() {
                self.log.debug(|| format!("Running task {}", id));

                match run_guarded(action) {
                    Ok(()) => self.log.debug(|| format!("Completed task {}", id)),
                    Err(failure) => self
                        .log
                        .error(&format!("Exception in task {}: {}", id, failure)),
                }
            }
        } else {
            self.log
                .debug(|| format!("Skipping task {} ({})", id, task.status()));
        }

        self.log.debug(|| format!("Cleaning up task {}", id));
        self.registry.remove(id);
    }
}
