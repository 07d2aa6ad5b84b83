//! Job definitions and the request shapes that create or patch them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SchedulerError;
use crate::retry::RetryPolicy;
use crate::schedule::{CronExpression, MODE_DAILY, MODE_MINUTES};

/// Value half of a schedule: a minute interval or an `HH:MM` string.
///
/// A whole-number float such as `20.0` reads as `Number(20)`. Any other
/// float is kept as text so the translator rejects it with a schedule error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ScheduleValue {
    Number(i64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScheduleValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<RawScheduleValue> for ScheduleValue {
    fn from(raw: RawScheduleValue) -> Self {
        match raw {
            RawScheduleValue::Integer(n) => Self::Number(n),
            RawScheduleValue::Float(f)
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 =>
            {
                Self::Number(f as i64)
            }
            RawScheduleValue::Float(f) => Self::Text(f.to_string()),
            RawScheduleValue::Text(s) => Self::Text(s),
        }
    }
}

impl<'de> Deserialize<'de> for ScheduleValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawScheduleValue::deserialize(deserializer).map(Self::from)
    }
}

impl fmt::Display for ScheduleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Human-friendly schedule, translated into cron before storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronSchedule {
    /// `minutes` or `daily`.
    pub mode: String,
    pub value: ScheduleValue,
}

impl CronSchedule {
    pub fn new(mode: impl Into<String>, value: ScheduleValue) -> Self {
        Self {
            mode: mode.into(),
            value,
        }
    }

    /// Every `n` minutes.
    pub fn minutes(n: i64) -> Self {
        Self::new(MODE_MINUTES, ScheduleValue::Number(n))
    }

    /// Once a day at `HH:MM`.
    pub fn daily(time: impl Into<String>) -> Self {
        Self::new(MODE_DAILY, ScheduleValue::Text(time.into()))
    }
}

/// Job priority. Stored and reported only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl fmt::Display for JobPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(s)
    }
}

impl FromStr for JobPriority {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(SchedulerError::InvalidJob(format!(
                "unknown priority '{}'",
                other
            ))),
        }
    }
}

/// Job definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDefinition {
    /// Unique job ID.
    pub id: String,
    pub name: String,
    pub cron_schedule: CronSchedule,
    /// HTTP endpoint fetched on every run.
    pub command: String,
    pub priority: JobPriority,
    /// Job ids whose latest execution must have completed.
    pub dependencies: Vec<String>,
    pub retry_policy: RetryPolicy,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobDefinition {
    /// Create a new job definition with defaults for the optional fields.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        cron_schedule: CronSchedule,
        command: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cron_schedule,
            command: command.into(),
            priority: JobPriority::default(),
            dependencies: Vec::new(),
            retry_policy: RetryPolicy::default(),
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Field checks that do not need the job registry.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.id.trim().is_empty() {
            return Err(SchedulerError::InvalidJob("id must not be empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(SchedulerError::InvalidJob(
                "name must not be empty".to_string(),
            ));
        }
        if self.command.trim().is_empty() {
            return Err(SchedulerError::InvalidJob(
                "command must not be empty".to_string(),
            ));
        }
        self.retry_policy.validate()
    }
}

/// Create request. The engine assigns the id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub name: String,
    pub cron_schedule: CronSchedule,
    pub command: String,
    #[serde(default)]
    pub priority: Option<JobPriority>,
    #[serde(default)]
    pub dependencies: Option<Vec<String>>,
    #[serde(default)]
    pub retry_policy: Option<RetryPolicy>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl NewJob {
    pub fn new(
        name: impl Into<String>,
        cron_schedule: CronSchedule,
        command: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            cron_schedule,
            command: command.into(),
            priority: None,
            dependencies: None,
            retry_policy: None,
            enabled: None,
        }
    }

    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = Some(retry_policy);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Fill defaults and stamp identity.
    pub fn into_definition(
        self,
        id: impl Into<String>,
        now: DateTime<Utc>,
        default_retry: &RetryPolicy,
    ) -> JobDefinition {
        JobDefinition {
            id: id.into(),
            name: self.name,
            cron_schedule: self.cron_schedule,
            command: self.command,
            priority: self.priority.unwrap_or_default(),
            dependencies: self.dependencies.unwrap_or_default(),
            retry_policy: self.retry_policy.unwrap_or_else(|| default_retry.clone()),
            enabled: self.enabled != Some(false),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update. Absent fields keep their current value; identity and
/// creation time are never patched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cron_schedule: Option<CronSchedule>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub priority: Option<JobPriority>,
    #[serde(default)]
    pub dependencies: Option<Vec<String>>,
    #[serde(default)]
    pub retry_policy: Option<RetryPolicy>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl JobPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cron_schedule.is_none()
            && self.command.is_none()
            && self.priority.is_none()
            && self.dependencies.is_none()
            && self.retry_policy.is_none()
            && self.enabled.is_none()
    }

    /// Produce the patched definition with `updatedAt = now`.
    pub fn apply(&self, current: &JobDefinition, now: DateTime<Utc>) -> JobDefinition {
        let mut next = current.clone();
        if let Some(name) = &self.name {
            next.name = name.clone();
        }
        if let Some(schedule) = &self.cron_schedule {
            next.cron_schedule = schedule.clone();
        }
        if let Some(command) = &self.command {
            next.command = command.clone();
        }
        if let Some(priority) = self.priority {
            next.priority = priority;
        }
        if let Some(dependencies) = &self.dependencies {
            next.dependencies = dependencies.clone();
        }
        if let Some(policy) = &self.retry_policy {
            next.retry_policy = policy.clone();
        }
        if let Some(enabled) = self.enabled {
            next.enabled = enabled;
        }
        next.updated_at = now;
        next
    }
}

/// Timer state reported alongside a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScheduleState {
    /// A cron timer is installed.
    Scheduled {
        expression: String,
        #[serde(rename = "nextRun")]
        next_run: Option<DateTime<Utc>>,
    },
    /// The job is disabled.
    Disabled { expression: String },
    /// Enabled, but its cron timer was cancelled with `unschedule_job`.
    Unscheduled { expression: String },
}

/// Read model returned by the lifecycle API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    #[serde(flatten)]
    pub definition: JobDefinition,
    pub schedule_state: ScheduleState,
}

impl JobView {
    pub(crate) fn build(
        definition: JobDefinition,
        expression: &CronExpression,
        scheduled: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let expr = expression.as_str().to_string();
        let schedule_state = if scheduled {
            ScheduleState::Scheduled {
                expression: expr,
                next_run: expression.next_after(&now),
            }
        } else if definition.enabled {
            ScheduleState::Unscheduled { expression: expr }
        } else {
            ScheduleState::Disabled { expression: expr }
        };
        Self {
            definition,
            schedule_state,
        }
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
