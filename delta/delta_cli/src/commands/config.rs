//! Configuration file handling
//!
//! The configuration is a TOML file whose keys mirror
//! [`ExecutorConfig`]. Missing keys take their defaults and unknown keys are
//! ignored.

use anyhow::{Context, Result};
use delta_executor::ExecutorConfig;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors specific to the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file {0} already exists (use --force to overwrite)")]
    AlreadyExists(PathBuf),
}

const HEADER: &str = "\
# Delta executor configuration
#
# core_thread_count           workers kept alive even when idle
# max_thread_count            upper bound on concurrent workers
# idle_thread_timeout         minutes an extra worker may idle before exiting
# nice_shutdown_passes        30 second waits attempted before forcing shutdown
# debug                       verbose executor logging
";

/// Render the default configuration as TOML
pub fn default_toml() -> Result<String> {
    let body = toml::to_string_pretty(&ExecutorConfig::default())
        .context("failed to render the default configuration")?;
    Ok(format!("{}\n{}", HEADER, body))
}

/// Write the default configuration to `path`
pub fn write_default(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()).into());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    fs::write(path, default_toml()?)
        .with_context(|| format!("failed to write configuration to {}", path.display()))
}

/// Parse the configuration at `path`
pub fn load(path: &Path) -> Result<ExecutorConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration from {}", path.display()))?;

    toml::from_str(&text)
        .with_context(|| format!("failed to parse configuration in {}", path.display()))
}

/// Parse the configuration at `path`, writing the defaults there first if the
/// file does not exist yet
pub fn load_or_create(path: &Path) -> Result<ExecutorConfig> {
    if !path.exists() {
        write_default(path, false)?;
        info!("Wrote default configuration to {}", path.display());
    }

    load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("delta.toml");

        let config = load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, ExecutorConfig::default());
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("delta.toml");

        write_default(&path, false).unwrap();
        let err = write_default(&path, false).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());

        write_default(&path, true).unwrap();
    }

    #[test]
    fn test_partial_and_unknown_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("delta.toml");
        fs::write(
            &path,
            "max_thread_count = 16\nnice_shutdown_passes = 1\ncolour = \"blue\"\n",
        )
        .unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.max_thread_count, 16);
        assert_eq!(config.nice_shutdown_passes, 1);
        assert_eq!(config.core_thread_count, 2);
    }

    #[test]
    fn test_malformed_file_names_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "max_thread_count = [").unwrap();

        let err = load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.toml"));
    }
}
