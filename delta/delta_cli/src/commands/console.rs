//! Console for a running executor
//!
//! Reads one command per line until `quit` or end of input, then shuts the
//! executor down.

use anyhow::{Context, Result};
use delta_executor::{global, Executor, LogFacade, ShutdownOutcome, TaskId};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

use super::config;

const DEBUG_USAGE: &str = "debug <on|off>";

/// A parsed console line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Queue a task sleeping for the given milliseconds
    Submit(u64),
    /// Queue a task that returns an error
    Fail,
    /// Queue a task that panics
    Panic,
    /// Cancel a task
    Cancel(TaskId),
    /// Turn debug logging on or off; `None` for an unrecognised argument
    Debug(Option<bool>),
    /// Print executor status
    Status,
    /// Leave the console
    Quit,
}

/// Errors parsing a console line
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

impl FromStr for ConsoleCommand {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next();

        match name.as_str() {
            "submit" => arg
                .and_then(|a| a.parse().ok())
                .map(Self::Submit)
                .ok_or(ConsoleError::Usage("submit <millis>")),
            "fail" => Ok(Self::Fail),
            "panic" => Ok(Self::Panic),
            "cancel" => arg
                .and_then(|a| a.parse().ok())
                .map(Self::Cancel)
                .ok_or(ConsoleError::Usage("cancel <id>")),
            "debug" => Ok(Self::Debug(match arg.map(str::to_lowercase).as_deref() {
                Some("on") => Some(true),
                Some("off") => Some(false),
                _ => None,
            })),
            "status" => Ok(Self::Status),
            "quit" | "exit" => Ok(Self::Quit),
            _ => Err(ConsoleError::Unknown(name)),
        }
    }
}

/// Load the configuration, start the process-wide executor and run the
/// console on stdin until it ends
pub fn run(config_path: &Path) -> Result<()> {
    let config = config::load_or_create(config_path)?;
    let logger = Arc::new(LogFacade::new(config.logger_name.clone()));

    let executor =
        global::initialize(config, logger).context("failed to initialize the executor")?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    drive(executor, stdin.lock(), &mut out)?;

    match executor.shutdown() {
        ShutdownOutcome::Forced { reclaimed } => writeln!(
            out,
            "Executor shut down forcibly ({} queued tasks run inline)",
            reclaimed
        )?,
        _ => writeln!(out, "Executor shut down")?,
    }

    Ok(())
}

/// Apply every command read from `input` to `executor`
pub fn drive<R, W>(executor: &Executor, input: R, out: &mut W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line.context("failed to read console input")?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        match line.parse::<ConsoleCommand>() {
            Ok(ConsoleCommand::Quit) => break,
            Ok(command) => apply(executor, command, out)?,
            Err(e) => writeln!(out, "Error: {}", e)?,
        }
    }

    Ok(())
}

fn apply<W: Write>(executor: &Executor, command: ConsoleCommand, out: &mut W) -> io::Result<()> {
    match command {
        ConsoleCommand::Submit(millis) => {
            let id = executor.execute(move || thread::sleep(Duration::from_millis(millis)));
            writeln!(out, "Submitted task {}", id)
        }
        ConsoleCommand::Fail => {
            let id = executor.execute_fallible(|| Err(anyhow::anyhow!("task failed on request")));
            writeln!(out, "Submitted task {}", id)
        }
        ConsoleCommand::Panic => {
            let id = executor.execute(|| panic!("task panicked on request"));
            writeln!(out, "Submitted task {}", id)
        }
        ConsoleCommand::Cancel(id) => writeln!(out, "Task {}: {}", id, executor.cancel(id)),
        ConsoleCommand::Debug(Some(enabled)) => {
            executor.set_debug_enabled(enabled);
            writeln!(out, "Debug: {}", if enabled { "ON" } else { "OFF" })
        }
        ConsoleCommand::Debug(None) => writeln!(out, "Usage: {}", DEBUG_USAGE),
        ConsoleCommand::Status => writeln!(
            out,
            "Accepting: {}, pending: {}, workers: {}, debug: {}",
            executor.is_accepting_new_tasks(),
            executor.pending_tasks(),
            executor.worker_count(),
            executor.is_debug_enabled()
        ),
        ConsoleCommand::Quit => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delta_executor::ExecutorConfig;
    use std::io::Cursor;

    fn executor() -> Executor {
        let config = ExecutorConfig {
            core_thread_count: 1,
            max_thread_count: 1,
            nice_shutdown_passes: 1,
            nice_shutdown_interval_secs: 1,
            ..Default::default()
        };
        Executor::new(config, Arc::new(LogFacade::new("console-test"))).unwrap()
    }

    fn drive_script(executor: &Executor, script: &str) -> String {
        let mut out = Vec::new();
        drive(executor, Cursor::new(script), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("submit 250".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Submit(250)));
        assert_eq!(
            "CANCEL #7".parse::<ConsoleCommand>(),
            Ok(ConsoleCommand::Cancel(TaskId::from_raw(7)))
        );
        assert_eq!("debug On".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Debug(Some(true))));
        assert_eq!("debug off".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Debug(Some(false))));
        assert_eq!("debug".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Debug(None)));
        assert_eq!("exit".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Quit));

        assert_eq!(
            "submit soon".parse::<ConsoleCommand>(),
            Err(ConsoleError::Usage("submit <millis>"))
        );
        assert_eq!(
            "launch".parse::<ConsoleCommand>(),
            Err(ConsoleError::Unknown("launch".to_string()))
        );
    }

    #[test]
    fn test_debug_toggle() {
        let executor = executor();

        let output = drive_script(&executor, "debug on\n");
        assert!(output.contains("Debug: ON"));
        assert!(executor.is_debug_enabled());

        let output = drive_script(&executor, "debug off\ndebug maybe\n");
        assert!(output.contains("Debug: OFF"));
        assert!(output.contains("Usage: debug <on|off>"));
        assert!(!executor.is_debug_enabled());
    }

    #[test]
    fn test_submit_and_cancel_unknown() {
        let executor = executor();

        let output = drive_script(&executor, "submit 1\n\ncancel 999999999\nbogus\nstatus\n");
        assert!(output.contains("Submitted task #"));
        assert!(output.contains("Task #999999999: NotFound"));
        assert!(output.contains("Error: unknown command 'bogus'"));
        assert!(output.contains("Accepting: true"));
    }

    #[test]
    fn test_quit_stops_reading() {
        let executor = executor();

        let output = drive_script(&executor, "quit\nsubmit 1\n");
        assert!(output.is_empty());
        assert_eq!(executor.pending_tasks(), 0);
    }
}
