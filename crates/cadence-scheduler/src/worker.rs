//! Logical worker registry with least-loaded selection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use cadence_config::WorkerConfig;

/// A logical execution slot pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerMachine {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub last_heartbeat: DateTime<Utc>,
    /// Execution ids currently assigned to this worker.
    pub current_jobs: Vec<String>,
    pub max_concurrent_jobs: usize,
}

impl WorkerMachine {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        max_concurrent_jobs: usize,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_active: true,
            last_heartbeat: now,
            current_jobs: Vec::new(),
            max_concurrent_jobs,
        }
    }

    pub fn from_config(config: &WorkerConfig, now: DateTime<Utc>) -> Self {
        Self::new(&config.id, &config.name, config.max_concurrent_jobs, now)
            .with_active(config.active)
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    pub fn load(&self) -> usize {
        self.current_jobs.len()
    }

    /// Active and below its ceiling.
    pub fn is_available(&self) -> bool {
        self.is_active && self.load() < self.max_concurrent_jobs
    }
}

/// Workers in registry order.
#[derive(Debug, Default)]
pub struct WorkerPool {
    workers: Vec<WorkerMachine>,
}

impl WorkerPool {
    pub fn new(workers: Vec<WorkerMachine>) -> Self {
        Self { workers }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&WorkerMachine> {
        self.workers.iter().find(|w| w.id == id)
    }

    /// Least-loaded available worker; ties go to the earliest registered.
    pub fn select(&self) -> Option<&WorkerMachine> {
        self.workers
            .iter()
            .filter(|w| w.is_available())
            .min_by_key(|w| w.load())
    }

    /// Select a worker and assign `execution_id` to it in one step.
    pub fn reserve(&mut self, execution_id: &str, now: DateTime<Utc>) -> Option<String> {
        let index = self
            .workers
            .iter()
            .enumerate()
            .filter(|(_, w)| w.is_available())
            .min_by_key(|(_, w)| w.load())
            .map(|(i, _)| i)?;

        let worker = &mut self.workers[index];
        worker.current_jobs.push(execution_id.to_string());
        worker.last_heartbeat = now;
        debug!(
            "Reserved worker {} for execution {} ({}/{})",
            worker.id,
            execution_id,
            worker.load(),
            worker.max_concurrent_jobs
        );
        Some(worker.id.clone())
    }

    /// Remove `execution_id` from `worker_id`. Returns whether it was assigned.
    pub fn release(&mut self, worker_id: &str, execution_id: &str, now: DateTime<Utc>) -> bool {
        let Some(worker) = self.workers.iter_mut().find(|w| w.id == worker_id) else {
            return false;
        };
        let before = worker.current_jobs.len();
        worker.current_jobs.retain(|id| id != execution_id);
        worker.last_heartbeat = now;
        worker.current_jobs.len() != before
    }

    /// Cloned snapshot in registry order.
    pub fn snapshot(&self) -> Vec<WorkerMachine> {
        self.workers.clone()
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
