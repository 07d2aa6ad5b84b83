//! Retry policy and failure decisions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use cadence_config::RetryPolicyConfig;

use crate::error::SchedulerError;

/// Per-job retry policy.
///
/// `retry_delay` is the base delay in milliseconds. The n-th retry waits
/// `retry_delay * backoff_multiplier^(n - 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Total attempt budget for one dispatch, including the first attempt.
    pub max_retries: u32,
    /// Base delay in milliseconds.
    pub retry_delay: u64,
    /// Exponential backoff multiplier.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: 1000,
            backoff_multiplier: 2.0,
        }
    }
}

impl From<&RetryPolicyConfig> for RetryPolicy {
    fn from(config: &RetryPolicyConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: config.retry_delay_ms,
            backoff_multiplier: config.backoff_multiplier,
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// Re-dispatch after `delay`, carrying `retry_count`.
    Retry { retry_count: u32, delay: Duration },
    /// The failure is terminal.
    GiveUp { retry_count: u32 },
}

impl RetryDecision {
    pub fn retry_count(&self) -> u32 {
        match self {
            Self::Retry { retry_count, .. } | Self::GiveUp { retry_count } => *retry_count,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: u64, backoff_multiplier: f64) -> Self {
        Self {
            max_retries,
            retry_delay,
            backoff_multiplier,
        }
    }

    /// Reject multipliers that would shrink or break the delay sequence.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(SchedulerError::InvalidRetryPolicy(format!(
                "backoffMultiplier must be a finite number >= 1 (got {})",
                self.backoff_multiplier
            )));
        }
        Ok(())
    }

    /// Delay before the retry that will carry `retry_count`.
    pub fn delay_for_retry(&self, retry_count: u32) -> Duration {
        let exponent = retry_count.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_ms = self.retry_delay as f64 * self.backoff_multiplier.powi(exponent);
        Duration::from_millis(delay_ms.round() as u64)
    }

    /// Decide the fate of an attempt that failed while carrying `retry_count`.
    pub fn on_failure(&self, retry_count: u32) -> RetryDecision {
        let attempts = retry_count.saturating_add(1);
        if attempts < self.max_retries {
            RetryDecision::Retry {
                retry_count: attempts,
                delay: self.delay_for_retry(attempts),
            }
        } else {
            RetryDecision::GiveUp {
                retry_count: attempts.min(self.max_retries),
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
