//! Scheduler errors.

use thiserror::Error;

/// Schedule translation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// `minutes` value is not an integer in 1..=59.
    #[error("Invalid minutes value '{0}': expected an integer between 1 and 59")]
    InvalidMinutes(String),

    /// `daily` value is not a valid `HH:MM` time.
    #[error("Invalid daily time '{0}': expected HH:MM")]
    InvalidDailyTime(String),

    /// Schedule mode is neither `minutes` nor `daily`.
    #[error("Unsupported schedule mode: {0}")]
    UnsupportedMode(String),

    /// The translated expression was rejected by the cron parser.
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },
}

/// Scheduler lifecycle errors.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Schedule could not be translated.
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(#[from] ScheduleError),

    /// A dependency names a job that does not exist.
    #[error("Job {job_id} depends on unknown job {dependency}")]
    UnknownDependency { job_id: String, dependency: String },

    /// Dependencies would form a cycle.
    #[error("Dependency cycle detected: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    /// Retry policy values are out of range.
    #[error("Invalid retry policy: {0}")]
    InvalidRetryPolicy(String),

    /// Any other invalid job field.
    #[error("Invalid job: {0}")]
    InvalidJob(String),
}

impl SchedulerError {
    /// Whether the error was caused by the caller's input.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::JobNotFound(_))
    }
}

/// Unit-of-work errors.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The request could not be sent or its body could not be read.
    #[error("Command \"{command}\" failed: {reason}")]
    Request { command: String, reason: String },

    /// The endpoint answered with a non-success status.
    #[error("Command \"{command}\" failed: {status} {body}")]
    Status {
        command: String,
        status: u16,
        body: String,
    },

    /// HTTP client construction failed.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// Generic runner failure.
    #[error("{0}")]
    Custom(String),
}
