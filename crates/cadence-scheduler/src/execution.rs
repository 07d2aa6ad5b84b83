//! Execution records and the bounded execution history.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dependency;

/// Execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    WaitingDependencies,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::WaitingDependencies => "waiting_dependencies",
        };
        f.write_str(s)
    }
}

/// One attempt to run a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobExecution {
    pub id: String,
    pub job_id: String,
    pub status: ExecutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<String>,
    /// Attempts already spent in this dispatch chain.
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// When the follow-up retry is due, if one was scheduled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_scheduled_at: Option<DateTime<Utc>>,
}

impl JobExecution {
    /// A pending record with a fresh id.
    pub fn new(job_id: impl Into<String>, retry_count: u32) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), job_id, retry_count)
    }

    pub fn with_id(id: impl Into<String>, job_id: impl Into<String>, retry_count: u32) -> Self {
        Self {
            id: id.into(),
            job_id: job_id.into(),
            status: ExecutionStatus::Pending,
            start_time: None,
            end_time: None,
            worker_id: None,
            retry_count,
            error: None,
            output: None,
            retry_scheduled_at: None,
        }
    }

    /// Mark running on `worker_id`.
    pub fn start(&mut self, worker_id: impl Into<String>, now: DateTime<Utc>) {
        self.status = ExecutionStatus::Running;
        self.worker_id = Some(worker_id.into());
        self.start_time = Some(now);
    }

    pub fn complete(&mut self, output: impl Into<String>, now: DateTime<Utc>) {
        self.status = ExecutionStatus::Completed;
        self.output = Some(output.into());
        self.end_time = Some(now);
    }

    pub fn fail(&mut self, error: impl Into<String>, now: DateTime<Utc>) {
        self.status = ExecutionStatus::Failed;
        self.error = Some(error.into());
        self.end_time = Some(now);
    }

    pub fn is_running(&self) -> bool {
        self.status == ExecutionStatus::Running
    }
}

pub const DEFAULT_RETENTION: usize = 10_000;

/// Execution history in insertion order, capped at `capacity` records.
///
/// When full, the oldest record that is not running is evicted. Running
/// records and each job's latest record are never evicted, so the
/// dependency gate always sees a job's most recent outcome. The history
/// may exceed its cap while every retained record is protected.
#[derive(Debug)]
pub struct ExecutionTracker {
    records: HashMap<String, JobExecution>,
    order: VecDeque<String>,
    capacity: usize,
}

impl ExecutionTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Publish a record, evicting old ones if over capacity.
    pub fn insert(&mut self, execution: JobExecution) {
        let id = execution.id.clone();
        if self.records.insert(id.clone(), execution).is_none() {
            self.order.push_back(id);
        }
        self.evict();
    }

    pub fn get(&self, id: &str) -> Option<&JobExecution> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut JobExecution> {
        self.records.get_mut(id)
    }

    /// All records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &JobExecution> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Records for one job, oldest first.
    pub fn for_job<'a>(&'a self, job_id: &'a str) -> impl Iterator<Item = &'a JobExecution> + 'a {
        self.iter().filter(move |e| e.job_id == job_id)
    }

    /// Cloned snapshot, optionally filtered by job.
    pub fn snapshot(&self, job_id: Option<&str>) -> Vec<JobExecution> {
        match job_id {
            Some(job_id) => self.for_job(job_id).cloned().collect(),
            None => self.iter().cloned().collect(),
        }
    }

    fn evict(&mut self) {
        if self.records.len() <= self.capacity {
            return;
        }
        let latest = self.latest_by_job();
        while self.records.len() > self.capacity {
            let position = self.order.iter().position(|id| {
                !latest.contains(id)
                    && self.records.get(id).is_some_and(|e| !e.is_running())
            });
            let Some(position) = position else {
                break;
            };
            if let Some(id) = self.order.remove(position) {
                self.records.remove(&id);
            }
        }
    }

    /// Ids of the record the dependency gate reads for each job.
    fn latest_by_job(&self) -> HashSet<String> {
        let mut latest: HashMap<&str, &JobExecution> = HashMap::new();
        for execution in self.iter() {
            latest
                .entry(execution.job_id.as_str())
                .and_modify(|current| {
                    let pair = [*current, execution];
                    if let Some(newest) = dependency::most_recent(pair.into_iter()) {
                        *current = newest;
                    }
                })
                .or_insert(execution);
        }
        latest.into_values().map(|e| e.id.clone()).collect()
    }
}

impl Default for ExecutionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;
