//! # Cadence Scheduler
//!
//! In-process job scheduling engine. Jobs carry a human-friendly schedule
//! (`minutes` or `daily`) that is translated into a five-field cron
//! expression; each cron tick dispatches the job onto a bounded pool of
//! logical workers.
//!
//! ## Key Components
//!
//! - [`JobScheduler`]: lifecycle API and dispatch path
//! - [`translate`]: schedule translator
//! - [`ExecutionTracker`]: bounded execution history
//! - [`WorkerPool`]: least-loaded worker selection and reservation
//! - [`RetryPolicy`]: exponential backoff decisions
//! - [`CommandRunner`]: unit-of-work seam, [`HttpCommandRunner`] in production
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cadence_scheduler::{CronSchedule, HttpCommandRunner, JobScheduler, NewJob};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = Arc::new(HttpCommandRunner::new()?);
//! let scheduler = JobScheduler::builder().build(runner);
//!
//! let job = scheduler.create_job(NewJob::new(
//!     "Log todos",
//!     CronSchedule::minutes(20),
//!     "https://jsonplaceholder.typicode.com/todos/1",
//! ))?;
//! scheduler.execute_job(&job.definition.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod definition;
pub mod dependency;
pub mod error;
pub mod execution;
pub mod retry;
pub mod runner;
pub mod schedule;
pub mod scheduler;
pub mod seed;
pub mod timer;
pub mod worker;

mod scheduler_dispatch;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, ManualClock, SystemClock};
pub use definition::{
    CronSchedule, JobDefinition, JobPatch, JobPriority, JobView, NewJob, ScheduleState,
    ScheduleValue,
};
pub use error::{RunnerError, ScheduleError, SchedulerError};
pub use execution::{ExecutionStatus, ExecutionTracker, JobExecution};
pub use retry::{RetryDecision, RetryPolicy};
pub use runner::{CommandRunner, HttpCommandRunner};
pub use schedule::{CronExpression, translate};
pub use scheduler::{JobScheduler, SchedulerBuilder};
pub use scheduler_dispatch::{DispatchOutcome, SkipReason};
pub use timer::PendingRetry;
pub use worker::{WorkerMachine, WorkerPool};
