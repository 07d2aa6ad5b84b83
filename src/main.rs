//! Cadence - cron-driven job scheduler
//!
//! Main entry point for the Cadence CLI and server.

mod cli;
mod server;

use std::path::Path;

use clap::Parser;
use tracing::{error, info, warn};

use cadence_config::{Config, ConfigError, ConfigLoader, ConfigValidator};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let work_dir = match cli.work_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    std::env::set_current_dir(&work_dir)?;

    let mut config = load_config(&cli.config)?;

    match cli.command {
        Some(Commands::CheckConfig) => {
            server::init_console_tracing(&config.logging);
            check_config(&cli.config, &config)
        }
        command => {
            if let Some(Commands::Run { host, port }) = command {
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }
            }
            server::init_tracing(&config.logging)?;
            info!("Working directory: {}", work_dir.display());
            server::run_server(config).await
        }
    }
}

/// Load the config file, falling back to defaults when it is missing.
fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        eprintln!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
    }
    ConfigLoader::load_or_default(path)
}

fn check_config(path: &Path, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let result = ConfigValidator::validate(config);
    for warning in &result.warnings {
        warn!("{}: {}", warning.path, warning.message);
    }
    for err in &result.errors {
        error!("{}: {}", err.path, err.message);
    }

    if !result.is_valid() {
        return Err(format!(
            "{} has {} configuration error(s)",
            path.display(),
            result.errors.len()
        )
        .into());
    }

    info!(
        "{} is valid: {} worker(s), {} seed job(s)",
        path.display(),
        config.scheduler.workers.len(),
        config.scheduler.jobs.len()
    );
    Ok(())
}
