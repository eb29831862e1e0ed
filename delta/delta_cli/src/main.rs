use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Delta Command Line Interface
///
/// Hosts a Delta executor: loads its configuration, feeds it work from the
/// console and shuts it down on exit.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    #[clap(name = "init-config")]
    InitConfig {
        /// Path of the configuration file
        #[clap(long, default_value = "delta.toml")]
        config: PathBuf,

        /// Overwrite an existing file
        #[clap(long)]
        force: bool,
    },

    /// Start the executor and read console commands from stdin
    Run {
        /// Path of the configuration file; created with defaults if missing
        #[clap(long, default_value = "delta.toml")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitConfig { config, force } => {
            commands::config::write_default(&config, force)?;
            println!("Wrote default configuration to {}", config.display());
        }
        Commands::Run { config } => commands::console::run(&config)?,
    }

    Ok(())
}

/// Logs go to stderr so the console output stays clean. `RUST_LOG` overrides
/// the default `info` filter.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}
