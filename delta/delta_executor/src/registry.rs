//! Registry of in-flight tasks.
//!
//! The only structure shared by submitters, cancellers and workers. It is
//! safe to insert, look up and remove from any thread without extra locking.

use dashmap::DashMap;
use std::sync::Arc;

use crate::task::{Task, TaskId};

/// Concurrent map from task id to task.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<DashMap<TaskId, Arc<Task>>>,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task and return a shared handle to it.
    pub fn insert(&self, task: Task) -> Arc<Task> {
        let task = Arc::new(task);
        self.tasks.insert(task.id(), task.clone());
        task
    }

    /// Look up a task. The map shard lock is released before returning.
    pub fn get(&self, id: TaskId) -> Option<Arc<Task>> {
        self.tasks.get(&id).map(|entry| entry.value().clone())
    }

    /// Deregister a task.
    pub fn remove(&self, id: TaskId) -> Option<Arc<Task>> {
        self.tasks.remove(&id).map(|(_, task)| task)
    }

    /// Whether a task is registered
    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is registered
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
