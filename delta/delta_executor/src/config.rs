//! Executor configuration.
//!
//! Mirrors the options a host exposes in its configuration file. Values are
//! taken as given; only the worker pool checks that its sizes make sense.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::pool::ThreadPoolConfig;

/// Length of one nice-shutdown pass.
pub const NICE_SHUTDOWN_PASS_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for an [`Executor`](crate::Executor)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Minimum number of worker threads kept warm
    #[serde(default = "default_core_thread_count")]
    pub core_thread_count: usize,

    /// Hard upper bound on concurrent workers
    #[serde(default = "default_max_thread_count")]
    pub max_thread_count: usize,

    /// Minutes an above-core worker may sit idle before it exits
    #[serde(default = "default_idle_thread_timeout")]
    pub idle_thread_timeout: u64,

    /// Number of waiting passes attempted before shutting down forcibly
    #[serde(default = "default_nice_shutdown_passes")]
    pub nice_shutdown_passes: u32,

    /// Verbose internal logging
    #[serde(default)]
    pub debug: bool,

    /// Target name the executor logs under
    #[serde(default = "default_logger_name")]
    pub logger_name: String,

    /// Seconds per nice-shutdown pass
    #[serde(default = "default_nice_shutdown_interval_secs")]
    pub nice_shutdown_interval_secs: u64,
}

fn default_core_thread_count() -> usize {
    2
}

fn default_max_thread_count() -> usize {
    4
}

fn default_idle_thread_timeout() -> u64 {
    5
}

fn default_nice_shutdown_passes() -> u32 {
    4
}

fn default_logger_name() -> String {
    "delta".to_string()
}

fn default_nice_shutdown_interval_secs() -> u64 {
    NICE_SHUTDOWN_PASS_INTERVAL.as_secs()
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            core_thread_count: default_core_thread_count(),
            max_thread_count: default_max_thread_count(),
            idle_thread_timeout: default_idle_thread_timeout(),
            nice_shutdown_passes: default_nice_shutdown_passes(),
            debug: false,
            logger_name: default_logger_name(),
            nice_shutdown_interval_secs: default_nice_shutdown_interval_secs(),
        }
    }
}

impl ExecutorConfig {
    /// Idle timeout for above-core workers
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_thread_timeout.saturating_mul(60))
    }

    /// Wait performed by each nice-shutdown pass
    pub fn nice_shutdown_interval(&self) -> Duration {
        Duration::from_secs(self.nice_shutdown_interval_secs)
    }

    /// Derive the worker pool configuration
    pub fn pool_config(&self) -> ThreadPoolConfig {
        ThreadPoolConfig {
            core_threads: self.core_thread_count,
            max_threads: self.max_thread_count,
            idle_timeout: self.idle_timeout(),
            thread_name_prefix: format!("{}-worker", self.logger_name),
            ..Default::default()
        }
    }
}
