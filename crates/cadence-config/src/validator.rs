//! Configuration validation.

use std::collections::HashSet;

use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_scheduler(config, &mut result);
        Self::validate_workers(config, &mut result);
        Self::validate_jobs(config, &mut result);

        result
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    fn validate_scheduler(config: &Config, result: &mut ValidationResult) {
        let scheduler = &config.scheduler;

        if scheduler.execution_retention == 0 {
            result.add_error(ValidationError::new(
                "scheduler.execution_retention",
                "execution_retention must be greater than 0",
            ));
        }

        let retry = &scheduler.default_retry;
        if retry.backoff_multiplier.is_nan() || retry.backoff_multiplier < 1.0 {
            result.add_error(ValidationError::new(
                "scheduler.default_retry.backoff_multiplier",
                "backoff_multiplier must be at least 1",
            ));
        }

        if retry.max_retries > 20 {
            result.add_warning(ValidationWarning::new(
                "scheduler.default_retry.max_retries",
                "max_retries is very high (>20), failing jobs will retry for a long time",
            ));
        }
    }

    fn validate_workers(config: &Config, result: &mut ValidationResult) {
        let workers = &config.scheduler.workers;

        if workers.is_empty() {
            result.add_error(ValidationError::new(
                "scheduler.workers",
                "At least one worker is required",
            ));
        }

        let mut seen = HashSet::new();
        for (i, worker) in workers.iter().enumerate() {
            if !seen.insert(worker.id.as_str()) {
                result.add_error(ValidationError::new(
                    format!("scheduler.workers[{}].id", i),
                    format!("Duplicate worker id '{}'", worker.id),
                ));
            }

            if worker.max_concurrent_jobs == 0 {
                result.add_error(ValidationError::new(
                    format!("scheduler.workers[{}].max_concurrent_jobs", i),
                    "max_concurrent_jobs must be greater than 0",
                ));
            }
        }

        if !workers.is_empty() && workers.iter().all(|w| !w.active) {
            result.add_warning(ValidationWarning::new(
                "scheduler.workers",
                "No worker is active, every dispatch will be skipped",
            ));
        }
    }

    fn validate_jobs(config: &Config, result: &mut ValidationResult) {
        for (i, job) in config.scheduler.jobs.iter().enumerate() {
            if job.name.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("scheduler.jobs[{}].name", i),
                    "Job name cannot be empty",
                ));
            }

            if job.command.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("scheduler.jobs[{}].command", i),
                    "Job command cannot be empty",
                ));
            } else if !job.command.starts_with("http://") && !job.command.starts_with("https://") {
                result.add_warning(ValidationWarning::new(
                    format!("scheduler.jobs[{}].command", i),
                    "command is not an http(s) URL and will fail with the HTTP runner",
                ));
            }

            if let Some(retry) = &job.retry_policy {
                if retry.backoff_multiplier.is_nan() || retry.backoff_multiplier < 1.0 {
                    result.add_error(ValidationError::new(
                        format!("scheduler.jobs[{}].retry_policy.backoff_multiplier", i),
                        "backoff_multiplier must be at least 1",
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
