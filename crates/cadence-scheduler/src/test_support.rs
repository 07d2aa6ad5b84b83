//! Shared fakes for unit tests.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::clock::ManualClock;
use crate::error::RunnerError;
use crate::runner::CommandRunner;
use crate::scheduler::JobScheduler;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 30).unwrap()
}

/// Runner that succeeds unless told otherwise, optionally holding every
/// call until a permit is added.
#[derive(Default)]
pub struct FakeRunner {
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    hold: Option<Arc<Semaphore>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holding(gate: Arc<Semaphore>) -> Self {
        Self {
            hold: Some(gate),
            ..Self::default()
        }
    }

    pub fn fail(&self, command: &str) {
        self.failing.lock().insert(command.to_string());
    }

    pub fn succeed(&self, command: &str) {
        self.failing.lock().remove(command);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, command: &str) -> Result<String, RunnerError> {
        self.calls.lock().push(command.to_string());
        if let Some(gate) = &self.hold {
            gate.acquire().await.unwrap().forget();
        }
        if self.failing.lock().contains(command) {
            return Err(RunnerError::Status {
                command: command.to_string(),
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(format!("ok: {}", command))
    }
}

pub struct Harness {
    pub scheduler: JobScheduler,
    pub runner: Arc<FakeRunner>,
    pub clock: Arc<ManualClock>,
}

pub fn harness() -> Harness {
    harness_with(FakeRunner::new(), |b| b)
}

pub fn harness_with(
    runner: FakeRunner,
    configure: impl FnOnce(crate::SchedulerBuilder) -> crate::SchedulerBuilder,
) -> Harness {
    let runner = Arc::new(runner);
    let clock = Arc::new(ManualClock::new(start_time()));
    let scheduler = configure(JobScheduler::builder().with_clock(clock.clone())).build(runner.clone());
    Harness {
        scheduler,
        runner,
        clock,
    }
}

/// Let spawned tasks run to their next suspension point.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
