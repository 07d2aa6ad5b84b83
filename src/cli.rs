//! CLI definitions for Cadence.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Cadence CLI.
#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Cron-driven job scheduler with dependencies, retries and a worker pool")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    /// Working directory
    #[arg(short, long, global = true)]
    pub work_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the scheduler and its REST API in the foreground (default)
    Run {
        /// Server host, overrides `server.host`
        #[arg(long)]
        host: Option<String>,

        /// Server port, overrides `server.port`
        #[arg(long)]
        port: Option<u16>,
    },

    /// Load and validate the configuration, then exit
    CheckConfig,
}
