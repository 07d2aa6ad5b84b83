//! Server initialization and startup logic for Cadence.

use std::sync::{Arc, OnceLock};

use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use cadence_api::{ApiServer, AppState, InterfaceConfig};
use cadence_config::{Config, ConfigValidator, LoggingConfig};
use cadence_scheduler::{HttpCommandRunner, SchedulerBuilder, seed::seed_jobs};

static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn env_filter(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
}

/// Initialize tracing with console output and, when enabled, a daily
/// rotated log file under `logging.dir`.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !logging.file {
        init_console_tracing(logging);
        return Ok(());
    }

    let log_dir = logging.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("cadence")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    // The guard flushes the file writer on drop and must outlive main.
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(env_filter(logging))
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Console-only tracing.
pub(crate) fn init_console_tracing(logging: &LoggingConfig) {
    tracing_subscriber::registry()
        .with(env_filter(logging))
        .with(fmt::layer().with_target(true).with_ansi(true))
        .init();
}

/// Run the scheduler and the REST API until Ctrl-C.
pub(crate) async fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting Cadence v{}", env!("CARGO_PKG_VERSION"));

    let validation = ConfigValidator::validate(&config);
    for warning in &validation.warnings {
        warn!("Config warning at {}: {}", warning.path, warning.message);
    }
    if !validation.is_valid() {
        for err in &validation.errors {
            error!("Config error at {}: {}", err.path, err.message);
        }
        return Err("invalid configuration".into());
    }

    let runner = Arc::new(HttpCommandRunner::new()?);
    let scheduler = SchedulerBuilder::from_config(&config.scheduler).build(runner);
    info!(
        "Scheduler initialized with {} worker(s)",
        scheduler.list_workers().len()
    );

    let seeded = seed_jobs(&scheduler, &config.scheduler.jobs);
    info!(
        "Seeded {}/{} job(s) from configuration",
        seeded.len(),
        config.scheduler.jobs.len()
    );

    let state = Arc::new(AppState::new(scheduler.clone()));
    let interface = InterfaceConfig::new(config.server.host.clone(), config.server.port);
    let server = ApiServer::new(interface, state);

    let result = server.run_until(shutdown_signal()).await;

    scheduler.shutdown();
    info!("Cadence stopped");
    result
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
