//! Tasks: one unit of work each, with an immutable id and a small status.
//!
//! A task is created on submission, claimed at most once by whoever wins the
//! `Waiting -> Running` transition, and dropped from the registry once its
//! execution attempt is over.

pub mod guard;
pub mod id;
pub mod status;

use parking_lot::Mutex;
use std::fmt;

pub use guard::{run_guarded, TaskFailure};
pub use id::TaskId;
pub use status::TaskStatus;

use status::StatusCell;

/// The unit of work wrapped by a task.
pub type Action = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// A submitted unit of work
pub struct Task {
    id: TaskId,
    status: StatusCell,
    action: Mutex<Option<Action>>,
}

impl Task {
    /// Create a waiting task with the next process-unique id
    pub fn new(action: Action) -> Self {
        Self {
            id: TaskId::next(),
            status: StatusCell::new(),
            action: Mutex::new(Some(action)),
        }
    }

    /// The task's id
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Current status
    pub fn status(&self) -> TaskStatus {
        self.status.get()
    }

    /// Claim the task for execution. Succeeds only from `Waiting`.
    pub fn try_mark_running(&self) -> bool {
        self.status
            .try_transition(TaskStatus::Waiting, TaskStatus::Running)
    }

    /// Cancel the task. Succeeds only from `Waiting`.
    pub fn try_mark_cancelled(&self) -> bool {
        self.status
            .try_transition(TaskStatus::Waiting, TaskStatus::Cancelled)
    }

    /// Take the action out of the task.
    ///
    /// Returns `None` unless the task is `Running` and the action has not
    /// been taken yet.
    pub fn take_action(&self) -> Option<Action> {
        if self.status() != TaskStatus::Running {
            return None;
        }
        self.action.lock().take()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Action {
        Box::new(|| Ok(()))
    }

    #[test]
    fn test_new_task_is_waiting() {
        let a = Task::new(noop());
        let b = Task::new(noop());
        assert_eq!(a.status(), TaskStatus::Waiting);
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_running_blocks_cancel() {
        let task = Task::new(noop());
        assert!(task.try_mark_running());
        assert!(!task.try_mark_cancelled());
        assert!(!task.try_mark_running());
        assert_eq!(task.status(), TaskStatus::Running);
    }

    #[test]
    fn test_cancelled_blocks_running() {
        let task = Task::new(noop());
        assert!(task.try_mark_cancelled());
        assert!(!task.try_mark_cancelled());
        assert!(!task.try_mark_running());
        assert_eq!(task.status(), TaskStatus::Cancelled);
        assert!(task.take_action().is_none());
    }

    #[test]
    fn test_action_taken_once() {
        let task = Task::new(noop());
        assert!(task.take_action().is_none());

        assert!(task.try_mark_running());
        assert!(task.take_action().is_some());
        assert!(task.take_action().is_none());
    }
}
