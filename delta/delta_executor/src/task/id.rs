//! Process-unique task identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Last identifier handed out in this process.
static LAST_TASK_ID: AtomicU64 = AtomicU64::new(0);

/// Identifier of a submitted task.
///
/// Identifiers are allocated from a single process-wide counter, so they are
/// strictly increasing in allocation order and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(u64);

impl TaskId {
    /// Allocate the next identifier. Never blocks and never fails.
    pub(crate) fn next() -> Self {
        Self(LAST_TASK_ID.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Wrap a raw value, e.g. one typed by a user.
    ///
    /// The result only refers to a task if that value was once allocated.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = ParseIntError;

    /// Accepts both `42` and `#42`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        digits.parse().map(Self)
    }
}

impl From<TaskId> for u64 {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[test]
    fn test_ids_strictly_increase() {
        let first = TaskId::next();
        let second = TaskId::next();
        assert!(second > first);
        assert!(first.as_u64() >= 1);
    }

    #[test]
    fn test_ids_unique_across_threads() {
        let seen = Arc::new(Mutex::new(HashSet::new()));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let seen = seen.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..500 {
                    let id = TaskId::next();
                    assert!(seen.lock().unwrap().insert(id));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(seen.lock().unwrap().len(), 4000);
    }

    #[test]
    fn test_parse_and_display() {
        let id: TaskId = "#17".parse().unwrap();
        assert_eq!(id, TaskId::from_raw(17));
        assert_eq!(id.to_string(), "#17");
        assert_eq!("17".parse::<TaskId>().unwrap(), id);
        assert!("seventeen".parse::<TaskId>().is_err());
    }
}
