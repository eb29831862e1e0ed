//! Task status state machine.
//!
//! A task starts `Waiting` and moves at most once, to either `Running` or
//! `Cancelled`. Both moves go through a single compare-and-swap, so when a
//! worker and a canceller race, exactly one of them wins.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Status of a submitted task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Registered, not yet claimed by a worker
    Waiting,

    /// Claimed by a worker; the action has started or is about to
    Running,

    /// Cancelled before any worker claimed it
    Cancelled,
}

impl TaskStatus {
    fn as_u8(self) -> u8 {
        match self {
            Self::Waiting => 0,
            Self::Running => 1,
            Self::Cancelled => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Waiting,
            1 => Self::Running,
            _ => Self::Cancelled,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Waiting => "Waiting",
            Self::Running => "Running",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// Atomic cell holding a [`TaskStatus`].
#[derive(Debug)]
pub(crate) struct StatusCell {
    value: AtomicU8,
}

impl StatusCell {
    pub(crate) fn new() -> Self {
        Self {
            value: AtomicU8::new(TaskStatus::Waiting.as_u8()),
        }
    }

    pub(crate) fn get(&self) -> TaskStatus {
        TaskStatus::from_u8(self.value.load(Ordering::SeqCst))
    }

    /// Move from `from` to `to` if the cell currently holds `from`.
    ///
    /// Returns `false` without side effects otherwise.
    pub(crate) fn try_transition(&self, from: TaskStatus, to: TaskStatus) -> bool {
        self.value
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_transitions_are_one_way() {
        let cell = StatusCell::new();
        assert_eq!(cell.get(), TaskStatus::Waiting);

        assert!(cell.try_transition(TaskStatus::Waiting, TaskStatus::Running));
        assert_eq!(cell.get(), TaskStatus::Running);

        assert!(!cell.try_transition(TaskStatus::Waiting, TaskStatus::Cancelled));
        assert!(!cell.try_transition(TaskStatus::Waiting, TaskStatus::Running));
        assert_eq!(cell.get(), TaskStatus::Running);
    }

    #[test]
    fn test_racing_transitions_have_one_winner() {
        for _ in 0..100 {
            let cell = Arc::new(StatusCell::new());
            let barrier = Arc::new(Barrier::new(2));
            let wins = Arc::new(AtomicUsize::new(0));

            let handles: Vec<_> = [TaskStatus::Running, TaskStatus::Cancelled]
                .into_iter()
                .map(|target| {
                    let cell = cell.clone();
                    let barrier = barrier.clone();
                    let wins = wins.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        if cell.try_transition(TaskStatus::Waiting, target) {
                            wins.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(wins.load(Ordering::SeqCst), 1);
            assert_ne!(cell.get(), TaskStatus::Waiting);
        }
    }
}
