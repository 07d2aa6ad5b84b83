//! Dispatch path: gate, reserve, run, record, retry.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::dependency;
use crate::error::{RunnerError, SchedulerError};
use crate::execution::JobExecution;
use crate::retry::RetryDecision;
use crate::scheduler::{JobScheduler, SchedulerInner, SchedulerState};
use crate::timer::{self, PendingRetry};

const ABORTED_ERROR: &str = "attempt aborted before completion";

/// Why a dispatch did not run. No execution record is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    DependenciesNotMet,
    NoWorkerAvailable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disabled => "job is disabled",
            Self::DependenciesNotMet => "dependencies not met",
            Self::NoWorkerAvailable => "no worker available",
        };
        f.write_str(s)
    }
}

/// Result of one dispatch attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Completed {
        execution_id: String,
    },
    Failed {
        execution_id: String,
        /// Set when the retry controller scheduled a follow-up attempt.
        retry: Option<PendingRetry>,
    },
    Skipped(SkipReason),
}

impl DispatchOutcome {
    pub fn execution_id(&self) -> Option<&str> {
        match self {
            Self::Completed { execution_id } | Self::Failed { execution_id, .. } => {
                Some(execution_id)
            }
            Self::Skipped(_) => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// A reserved worker slot plus its RUNNING record.
///
/// Dropping an unsettled attempt releases the worker and fails the record,
/// so a cancelled or panicking dispatch never leaks a reservation.
struct Attempt {
    inner: Arc<SchedulerInner>,
    job_id: String,
    job_name: String,
    execution_id: String,
    worker_id: String,
    retry_count: u32,
    settled: bool,
}

impl Drop for Attempt {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let now = self.inner.clock.now();
        let mut state = self.inner.state.lock();
        state
            .workers
            .release(&self.worker_id, &self.execution_id, now);
        if let Some(execution) = state.executions.get_mut(&self.execution_id) {
            if execution.is_running() {
                execution.fail(ABORTED_ERROR, now);
            }
        }
        warn!(
            job_id = %self.job_id,
            execution_id = %self.execution_id,
            worker_id = %self.worker_id,
            "Job {} attempt aborted, worker released",
            self.job_name
        );
    }
}

enum Begin {
    Started { command: String, attempt: Attempt },
    Skipped(SkipReason),
}

impl JobScheduler {
    /// Dispatch a job now and wait for the attempt to finish.
    pub async fn execute_job(&self, job_id: &str) -> Result<DispatchOutcome, SchedulerError> {
        self.dispatch(job_id, 0).await
    }

    /// Dispatch a job in the background.
    pub fn trigger_job(&self, job_id: &str) -> Result<(), SchedulerError> {
        if !self.inner.state.lock().jobs.contains_key(job_id) {
            return Err(SchedulerError::JobNotFound(job_id.to_string()));
        }
        self.spawn_dispatch(job_id.to_string());
        Ok(())
    }

    pub(crate) fn spawn_dispatch(&self, job_id: String) {
        let scheduler = self.clone();
        tokio::spawn(async move {
            if let Err(e) = scheduler.dispatch(&job_id, 0).await {
                warn!(job_id = %job_id, "Dispatch failed: {}", e);
            }
        });
    }

    pub(crate) async fn dispatch(
        &self,
        job_id: &str,
        retry_count: u32,
    ) -> Result<DispatchOutcome, SchedulerError> {
        let (command, mut attempt) = match self.begin_attempt(job_id, retry_count)? {
            Begin::Started { command, attempt } => (command, attempt),
            Begin::Skipped(reason) => return Ok(DispatchOutcome::Skipped(reason)),
        };

        let result = self.inner.runner.run(&command).await;
        Ok(self.finish_attempt(&mut attempt, result))
    }

    fn begin_attempt(&self, job_id: &str, retry_count: u32) -> Result<Begin, SchedulerError> {
        let now = self.inner.clock.now();
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;

        let job = state
            .jobs
            .get(job_id)
            .ok_or_else(|| SchedulerError::JobNotFound(job_id.to_string()))?;
        let definition = &job.definition;

        if !definition.enabled {
            info!(job_id = %job_id, "Job {} is disabled, skipping", definition.name);
            return Ok(Begin::Skipped(SkipReason::Disabled));
        }

        if !dependency::is_satisfied(&definition.dependencies, &state.executions) {
            info!(job_id = %job_id, "Job {} waiting for dependencies", definition.name);
            return Ok(Begin::Skipped(SkipReason::DependenciesNotMet));
        }

        let execution_id = Uuid::new_v4().to_string();
        let Some(worker_id) = state.workers.reserve(&execution_id, now) else {
            warn!(job_id = %job_id, "No available workers for job {}", definition.name);
            return Ok(Begin::Skipped(SkipReason::NoWorkerAvailable));
        };

        let mut execution = JobExecution::with_id(&execution_id, job_id, retry_count);
        execution.start(&worker_id, now);
        state.executions.insert(execution);

        info!(
            job_id = %job_id,
            execution_id = %execution_id,
            worker_id = %worker_id,
            retry_count,
            "Starting job {} on worker {}",
            definition.name,
            worker_id
        );

        Ok(Begin::Started {
            command: definition.command.clone(),
            attempt: Attempt {
                inner: self.inner.clone(),
                job_id: job_id.to_string(),
                job_name: definition.name.clone(),
                execution_id,
                worker_id,
                retry_count,
                settled: false,
            },
        })
    }

    fn finish_attempt(
        &self,
        attempt: &mut Attempt,
        result: Result<String, RunnerError>,
    ) -> DispatchOutcome {
        let now = self.inner.clock.now();
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;

        attempt.settled = true;
        state
            .workers
            .release(&attempt.worker_id, &attempt.execution_id, now);
        let execution_id = attempt.execution_id.clone();

        let error = match result {
            Ok(output) => {
                if let Some(execution) = state.executions.get_mut(&execution_id) {
                    execution.complete(output, now);
                }
                info!(
                    job_id = %attempt.job_id,
                    execution_id = %execution_id,
                    "Job {} completed successfully",
                    attempt.job_name
                );
                return DispatchOutcome::Completed { execution_id };
            }
            Err(e) => e.to_string(),
        };

        error!(
            job_id = %attempt.job_id,
            execution_id = %execution_id,
            "Job {} failed: {}",
            attempt.job_name,
            error
        );

        // A job deleted mid-flight has no policy left to consult.
        let decision = match state.jobs.get(&attempt.job_id) {
            Some(job) => job.definition.retry_policy.on_failure(attempt.retry_count),
            None => RetryDecision::GiveUp {
                retry_count: attempt.retry_count,
            },
        };
        let retry_count = decision.retry_count();

        let retry = match decision {
            RetryDecision::Retry { retry_count, delay } => Some(self.schedule_retry(
                state,
                &attempt.job_id,
                &attempt.job_name,
                retry_count,
                delay,
                now,
            )),
            RetryDecision::GiveUp { retry_count } => {
                error!(
                    job_id = %attempt.job_id,
                    "Job {} failed after {} attempts",
                    attempt.job_name,
                    retry_count.max(1)
                );
                None
            }
        };

        if let Some(execution) = state.executions.get_mut(&execution_id) {
            execution.fail(error, now);
            execution.retry_count = retry_count;
            execution.retry_scheduled_at = retry.as_ref().map(|r| r.due_at);
        }

        DispatchOutcome::Failed {
            execution_id,
            retry,
        }
    }

    fn schedule_retry(
        &self,
        state: &mut SchedulerState,
        job_id: &str,
        job_name: &str,
        retry_count: u32,
        delay: Duration,
        now: DateTime<Utc>,
    ) -> PendingRetry {
        let due_at = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let retry = PendingRetry {
            id: Uuid::new_v4().to_string(),
            job_id: job_id.to_string(),
            retry_count,
            due_at,
        };
        let token = state.timers.add_retry(retry.clone());

        let weak = Arc::downgrade(&self.inner);
        let retry_id = retry.id.clone();
        timer::spawn_delayed(delay, token, async move {
            if let Some(inner) = weak.upgrade() {
                JobScheduler { inner }.run_retry(&retry_id).await;
            }
        });

        info!(
            job_id = %job_id,
            "Retrying job {} in {}ms (retry {})",
            job_name,
            delay.as_millis(),
            retry_count
        );
        retry
    }

    async fn run_retry(&self, retry_id: &str) {
        let claimed = self.inner.state.lock().timers.take_retry(retry_id);
        let Some(retry) = claimed else {
            debug!("Retry {} was cancelled", retry_id);
            return;
        };

        match self.dispatch(&retry.job_id, retry.retry_count).await {
            Ok(DispatchOutcome::Skipped(reason)) => {
                info!(job_id = %retry.job_id, "Retry skipped: {}", reason);
            }
            Ok(_) => {}
            Err(e) => warn!(job_id = %retry.job_id, "Retry dispatch failed: {}", e),
        }
    }
}

#[cfg(test)]
#[path = "scheduler_dispatch_tests.rs"]
mod tests;
