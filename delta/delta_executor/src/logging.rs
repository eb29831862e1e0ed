//! Logging sink for the executor.
//!
//! The executor never talks to a concrete logger. It writes leveled messages
//! to a [`Logger`] supplied by the host. [`LogFacade`] is the usual choice and
//! forwards everything to the `log` crate under the host's target name.

use log::Level;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A sink accepting leveled text messages.
pub trait Logger: Send + Sync {
    /// Record a message at the given level
    fn log(&self, level: Level, message: &str);
}

/// Forwards messages to the `log` facade under a fixed target.
#[derive(Debug, Clone)]
pub struct LogFacade {
    target: String,
}

impl LogFacade {
    /// Create a sink logging under `target`
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// The target messages are logged under
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Logger for LogFacade {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: self.target.as_str(), level, "{}", message);
    }
}

/// The executor's view of its logger: a sink plus the debug toggle.
///
/// Debug output is emitted at info level with a `[Debug]` prefix, and only
/// while the toggle is on. The toggle changes nothing but verbosity.
pub(crate) struct ExecutorLog {
    sink: Arc<dyn Logger>,
    debug_enabled: AtomicBool,
}

impl ExecutorLog {
    pub(crate) fn new(sink: Arc<dyn Logger>, debug_enabled: bool) -> Self {
        Self {
            sink,
            debug_enabled: AtomicBool::new(debug_enabled),
        }
    }

    pub(crate) fn is_debug_enabled(&self) -> bool {
        self.debug_enabled.load(Ordering::Relaxed)
    }

    pub(crate) fn set_debug_enabled(&self, enabled: bool) {
        self.debug_enabled.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn info(&self, message: &str) {
        self.sink.log(Level::Info, message);
    }

    pub(crate) fn error(&self, message: &str) {
        self.sink.log(Level::Error, message);
    }

    /// Logs only when debug is enabled. The message is built lazily.
    pub(crate) fn debug<F>(&self, message: F)
    where
        F: FnOnce() -> String,
    {
        if self.is_debug_enabled() {
            self.sink.log(Level::Info, &format!("[Debug] {}", message()));
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Captures every message for later inspection.
    #[derive(Default)]
    pub(crate) struct RecordingLogger {
        pub(crate) records: Mutex<Vec<(Level, String)>>,
    }

    impl RecordingLogger {
        pub(crate) fn contains(&self, level: Level, needle: &str) -> bool {
            self.records
                .lock()
                .iter()
                .any(|(l, m)| *l == level && m.contains(needle))
        }
    }

    impl Logger for RecordingLogger {
        fn log(&self, level: Level, message: &str) {
            self.records.lock().push((level, message.to_string()));
        }
    }

    #[test]
    fn test_debug_gated_by_toggle() {
        let sink = Arc::new(RecordingLogger::default());
        let log = ExecutorLog::new(sink.clone(), false);

        log.debug(|| "hidden".to_string());
        assert!(sink.records.lock().is_empty());

        log.set_debug_enabled(true);
        log.debug(|| "shown".to_string());
        assert!(sink.contains(Level::Info, "[Debug] shown"));
    }

    #[test]
    fn test_levels_forwarded() {
        let sink = Arc::new(RecordingLogger::default());
        let log = ExecutorLog::new(sink.clone(), false);

        log.info("starting");
        log.error("broken");

        assert!(sink.contains(Level::Info, "starting"));
        assert!(sink.contains(Level::Error, "broken"));
    }

    #[test]
    fn test_log_facade_target() {
        let facade = LogFacade::new("delta");
        assert_eq!(facade.target(), "delta");
        // No logger installed; this must simply not panic.
        facade.log(Level::Info, "message");
    }
}
