//! Scheduler core: job registry and lifecycle API.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use cadence_config::{SchedulerConfig, WorkerConfig};

use crate::clock::{Clock, SystemClock};
use crate::definition::{JobDefinition, JobPatch, JobView, NewJob};
use crate::dependency;
use crate::error::SchedulerError;
use crate::execution::{DEFAULT_RETENTION, ExecutionTracker, JobExecution};
use crate::retry::RetryPolicy;
use crate::runner::CommandRunner;
use crate::schedule::{CronExpression, translate};
use crate::timer::{self, PendingRetry, TimerRegistry};
use crate::worker::{WorkerMachine, WorkerPool};

pub(crate) struct StoredJob {
    pub(crate) definition: JobDefinition,
    pub(crate) expression: CronExpression,
}

/// Everything guarded by the engine lock.
pub(crate) struct SchedulerState {
    pub(crate) jobs: HashMap<String, StoredJob>,
    /// Job ids in creation order.
    pub(crate) job_order: Vec<String>,
    pub(crate) executions: ExecutionTracker,
    pub(crate) workers: WorkerPool,
    pub(crate) timers: TimerRegistry,
}

pub(crate) struct SchedulerInner {
    pub(crate) state: Mutex<SchedulerState>,
    pub(crate) runner: Arc<dyn CommandRunner>,
    pub(crate) clock: Arc<dyn Clock>,
    default_retry: RetryPolicy,
}

impl Drop for SchedulerInner {
    fn drop(&mut self) {
        self.state.get_mut().timers.cancel_all();
    }
}

/// Builder for [`JobScheduler`].
pub struct SchedulerBuilder {
    workers: Option<Vec<WorkerConfig>>,
    clock: Arc<dyn Clock>,
    execution_retention: usize,
    default_retry: RetryPolicy,
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self {
            workers: None,
            clock: Arc::new(SystemClock),
            execution_retention: DEFAULT_RETENTION,
            default_retry: RetryPolicy::default(),
        }
    }
}

impl SchedulerBuilder {
    /// Workers, retention and default retry policy from configuration.
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::default()
            .with_workers(config.workers.clone())
            .with_execution_retention(config.execution_retention)
            .with_default_retry(RetryPolicy::from(&config.default_retry))
    }

    pub fn with_workers(mut self, workers: Vec<WorkerConfig>) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_worker(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        max_concurrent_jobs: usize,
    ) -> Self {
        self.workers
            .get_or_insert_with(Vec::new)
            .push(WorkerConfig::new(id, name, max_concurrent_jobs));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_execution_retention(mut self, capacity: usize) -> Self {
        self.execution_retention = capacity;
        self
    }

    pub fn with_default_retry(mut self, policy: RetryPolicy) -> Self {
        self.default_retry = policy;
        self
    }

    pub fn build(self, runner: Arc<dyn CommandRunner>) -> JobScheduler {
        let now = self.clock.now();
        let workers = self
            .workers
            .unwrap_or_else(|| SchedulerConfig::default().workers)
            .iter()
            .map(|config| WorkerMachine::from_config(config, now))
            .collect();

        let state = SchedulerState {
            jobs: HashMap::new(),
            job_order: Vec::new(),
            executions: ExecutionTracker::new(self.execution_retention),
            workers: WorkerPool::new(workers),
            timers: TimerRegistry::new(),
        };

        JobScheduler {
            inner: Arc::new(SchedulerInner {
                state: Mutex::new(state),
                runner,
                clock: self.clock,
                default_retry: self.default_retry,
            }),
        }
    }
}

/// The scheduling engine.
///
/// Cheap to clone; all clones share one registry. Methods that install
/// timers spawn tokio tasks and must be called inside a runtime.
#[derive(Clone)]
pub struct JobScheduler {
    pub(crate) inner: Arc<SchedulerInner>,
}

impl JobScheduler {
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::default()
    }

    /// Create a job with a fresh id and schedule it.
    pub fn create_job(&self, new_job: NewJob) -> Result<JobView, SchedulerError> {
        let now = self.inner.clock.now();
        let definition =
            new_job.into_definition(Uuid::new_v4().to_string(), now, &self.inner.default_retry);
        self.schedule_job(definition)
    }

    /// Store `definition` and (re)install its cron timer.
    ///
    /// Validation happens before anything is touched; on error the registry
    /// is unchanged.
    pub fn schedule_job(&self, definition: JobDefinition) -> Result<JobView, SchedulerError> {
        let mut state = self.inner.state.lock();
        self.schedule_locked(&mut state, definition)
    }

    /// Cancel the job's cron timer. The definition stays stored.
    pub fn unschedule_job(&self, job_id: &str) {
        if self.inner.state.lock().timers.cancel_cron(job_id) {
            info!(job_id = %job_id, "Unscheduled job {}", job_id);
        }
    }

    /// Apply `patch` to an existing job and reschedule it.
    pub fn update_job(&self, job_id: &str, patch: JobPatch) -> Result<JobView, SchedulerError> {
        let now = self.inner.clock.now();
        let mut state = self.inner.state.lock();
        let current = state
            .jobs
            .get(job_id)
            .ok_or_else(|| SchedulerError::JobNotFound(job_id.to_string()))?;
        let updated = patch.apply(&current.definition, now);
        self.schedule_locked(&mut state, updated)
    }

    /// Remove a job, its cron timer and its pending retries.
    pub fn delete_job(&self, job_id: &str) -> bool {
        let mut state = self.inner.state.lock();
        state.timers.cancel_cron(job_id);
        let cancelled = state.timers.cancel_retries_for(job_id);
        let Some(removed) = state.jobs.remove(job_id) else {
            return false;
        };
        state.job_order.retain(|id| id != job_id);

        info!(
            job_id = %job_id,
            "Deleted job {} ({} pending retries cancelled)",
            removed.definition.name,
            cancelled
        );
        true
    }

    pub fn list_jobs(&self) -> Vec<JobView> {
        let state = self.inner.state.lock();
        let now = self.inner.clock.now();
        state
            .job_order
            .iter()
            .filter_map(|id| state.jobs.get(id))
            .map(|job| Self::view(&state, job, now))
            .collect()
    }

    pub fn get_job(&self, job_id: &str) -> Option<JobView> {
        let state = self.inner.state.lock();
        let now = self.inner.clock.now();
        state.jobs.get(job_id).map(|job| Self::view(&state, job, now))
    }

    /// Executions oldest first, optionally for one job.
    pub fn list_executions(&self, job_id: Option<&str>) -> Vec<JobExecution> {
        self.inner.state.lock().executions.snapshot(job_id)
    }

    pub fn get_execution(&self, execution_id: &str) -> Option<JobExecution> {
        self.inner.state.lock().executions.get(execution_id).cloned()
    }

    pub fn list_workers(&self) -> Vec<WorkerMachine> {
        self.inner.state.lock().workers.snapshot()
    }

    pub fn pending_retries(&self) -> Vec<PendingRetry> {
        self.inner.state.lock().timers.pending_retries()
    }

    /// Ids of jobs with a live cron timer, sorted.
    pub fn scheduled_job_ids(&self) -> Vec<String> {
        self.inner.state.lock().timers.cron_job_ids()
    }

    /// Cancel every cron and retry timer. In-flight attempts finish normally.
    pub fn shutdown(&self) {
        self.inner.state.lock().timers.cancel_all();
        info!("Scheduler timers cancelled");
    }

    fn schedule_locked(
        &self,
        state: &mut SchedulerState,
        definition: JobDefinition,
    ) -> Result<JobView, SchedulerError> {
        definition.validate()?;
        let expression = translate(&definition.cron_schedule)?;

        // Dependencies the job already had stay acceptable even if their
        // target has since been deleted.
        let previous: Vec<String> = state
            .jobs
            .get(&definition.id)
            .map(|job| job.definition.dependencies.clone())
            .unwrap_or_default();
        let jobs = &state.jobs;
        dependency::validate_dependencies(&definition.id, &definition.dependencies, |id| {
            match jobs.get(id) {
                Some(job) => Some(job.definition.dependencies.as_slice()),
                None if previous.iter().any(|p| p == id) => Some(&[][..]),
                None => None,
            }
        })?;

        let now = self.inner.clock.now();
        let job_id = definition.id.clone();
        state.timers.cancel_cron(&job_id);
        if definition.enabled {
            self.install_cron(state, &job_id, &expression);
        }

        info!(
            job_id = %job_id,
            "Scheduled job {} with cron expression: {}{}",
            definition.name,
            expression,
            if definition.enabled { "" } else { " (disabled)" }
        );

        let view = JobView::build(definition.clone(), &expression, definition.enabled, now);
        if state
            .jobs
            .insert(job_id.clone(), StoredJob { definition, expression })
            .is_none()
        {
            state.job_order.push(job_id);
        }
        Ok(view)
    }

    fn install_cron(&self, state: &mut SchedulerState, job_id: &str, expression: &CronExpression) {
        let token = state.timers.install_cron(job_id, expression.as_str());
        let weak = Arc::downgrade(&self.inner);

        timer::spawn_cron_loop(
            job_id.to_string(),
            expression.clone(),
            self.inner.clock.clone(),
            token,
            move |job_id| match weak.upgrade() {
                Some(inner) => {
                    debug!(job_id = %job_id, "Cron tick");
                    JobScheduler { inner }.spawn_dispatch(job_id.to_string());
                    true
                }
                None => {
                    warn!(job_id = %job_id, "Scheduler dropped, stopping cron timer");
                    false
                }
            },
        );
    }

    fn view(state: &SchedulerState, job: &StoredJob, now: chrono::DateTime<chrono::Utc>) -> JobView {
        JobView::build(
            job.definition.clone(),
            &job.expression,
            state.timers.has_cron(&job.definition.id),
            now,
        )
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
