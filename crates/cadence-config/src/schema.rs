//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::loader::ConfigLoader;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

/// Scheduler engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum number of execution records kept in memory.
    #[serde(default = "default_execution_retention")]
    pub execution_retention: usize,

    /// Retry policy applied to jobs created without one.
    #[serde(default)]
    pub default_retry: RetryPolicyConfig,

    /// Worker registry seeded at startup.
    #[serde(default = "default_workers")]
    pub workers: Vec<WorkerConfig>,

    /// Jobs created at startup.
    #[serde(default)]
    pub jobs: Vec<JobSeed>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            execution_retention: default_execution_retention(),
            default_retry: RetryPolicyConfig::default(),
            workers: default_workers(),
            jobs: Vec::new(),
        }
    }
}

fn default_execution_retention() -> usize {
    10_000
}

fn default_workers() -> Vec<WorkerConfig> {
    vec![
        WorkerConfig::new("worker-1", "Worker Node 1", 3),
        WorkerConfig::new("worker-2", "Worker Node 2", 2),
        WorkerConfig::new("worker-3", "Worker Node 3", 4),
    ]
}

/// Retry policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicyConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicyConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

/// A worker machine entry in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub id: String,
    pub name: String,
    pub max_concurrent_jobs: usize,

    #[serde(default = "default_true")]
    pub active: bool,
}

impl WorkerConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>, max_concurrent_jobs: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max_concurrent_jobs,
            active: true,
        }
    }
}

/// A job created when the scheduler starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSeed {
    pub name: String,
    pub command: String,
    pub schedule: SeedSchedule,

    /// `high`, `medium` or `low`. Defaults to medium.
    #[serde(default)]
    pub priority: Option<String>,

    /// Names of other seed jobs this one depends on.
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub retry_policy: Option<RetryPolicyConfig>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Trigger description of a seed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedSchedule {
    pub mode: String,
    pub value: SeedValue,
}

/// Schedule value as written in TOML: `20` or `"12:02"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeedValue {
    Number(i64),
    Text(String),
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write daily-rotated log files in addition to the console.
    #[serde(default = "default_true")]
    pub file: bool,

    /// Log directory. Defaults to `~/.cadence/logs`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_true(),
            dir: None,
        }
    }
}

impl LoggingConfig {
    /// Resolved log directory, with a leading `~` expanded.
    pub fn log_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => PathBuf::from(ConfigLoader::expand_path(&dir.to_string_lossy())),
            None => cadence_home().join("logs"),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// The `~/.cadence` directory.
pub fn cadence_home() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".cadence"))
        .unwrap_or_else(|| PathBuf::from(".cadence"))
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
