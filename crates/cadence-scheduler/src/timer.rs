//! Cron and retry timers.
//!
//! Timers are tokio tasks guarded by a [`CancellationToken`]. The registry
//! only keeps the tokens and the metadata readers need; the tasks themselves
//! are spawned with [`spawn_cron_loop`] and [`spawn_delayed`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::clock::Clock;
use crate::schedule::CronExpression;

/// A retry waiting for its delay to elapse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRetry {
    pub id: String,
    pub job_id: String,
    /// Retry count the re-dispatched execution will carry.
    pub retry_count: u32,
    pub due_at: DateTime<Utc>,
}

struct CronTimer {
    expression: String,
    token: CancellationToken,
}

struct RetryTimer {
    info: PendingRetry,
    token: CancellationToken,
}

/// Live timer handles keyed by job id (cron) and retry id (retries).
#[derive(Default)]
pub struct TimerRegistry {
    cron: HashMap<String, CronTimer>,
    retries: HashMap<String, RetryTimer>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cron timer for `job_id`, cancelling any previous one.
    pub fn install_cron(&mut self, job_id: &str, expression: &str) -> CancellationToken {
        self.cancel_cron(job_id);
        let token = CancellationToken::new();
        self.cron.insert(
            job_id.to_string(),
            CronTimer {
                expression: expression.to_string(),
                token: token.clone(),
            },
        );
        token
    }

    pub fn cancel_cron(&mut self, job_id: &str) -> bool {
        match self.cron.remove(job_id) {
            Some(timer) => {
                timer.token.cancel();
                debug!("Cron timer for job {} cancelled ({})", job_id, timer.expression);
                true
            }
            None => false,
        }
    }

    pub fn has_cron(&self, job_id: &str) -> bool {
        self.cron.contains_key(job_id)
    }

    /// Job ids with an installed cron timer, sorted.
    pub fn cron_job_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.cron.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn add_retry(&mut self, info: PendingRetry) -> CancellationToken {
        let token = CancellationToken::new();
        self.retries.insert(
            info.id.clone(),
            RetryTimer {
                info,
                token: token.clone(),
            },
        );
        token
    }

    /// Claim a retry whose delay elapsed. `None` if it was cancelled.
    pub fn take_retry(&mut self, retry_id: &str) -> Option<PendingRetry> {
        self.retries.remove(retry_id).map(|timer| timer.info)
    }

    /// Cancel every pending retry of `job_id`. Returns how many were cancelled.
    pub fn cancel_retries_for(&mut self, job_id: &str) -> usize {
        let ids: Vec<String> = self
            .retries
            .values()
            .filter(|timer| timer.info.job_id == job_id)
            .map(|timer| timer.info.id.clone())
            .collect();

        for id in &ids {
            if let Some(timer) = self.retries.remove(id) {
                timer.token.cancel();
            }
        }
        ids.len()
    }

    /// Pending retries ordered by due time.
    pub fn pending_retries(&self) -> Vec<PendingRetry> {
        let mut pending: Vec<PendingRetry> =
            self.retries.values().map(|timer| timer.info.clone()).collect();
        pending.sort_by(|a, b| a.due_at.cmp(&b.due_at).then_with(|| a.id.cmp(&b.id)));
        pending
    }

    pub fn cancel_all(&mut self) {
        for (_, timer) in self.cron.drain() {
            timer.token.cancel();
        }
        for (_, timer) in self.retries.drain() {
            timer.token.cancel();
        }
    }
}

/// Spawn a loop that calls `fire` at every cron tick until `token` is
/// cancelled or `fire` returns `false`.
///
/// Fire times come from `clock`; the wait between ticks is tokio time.
pub fn spawn_cron_loop<F>(
    job_id: String,
    expression: CronExpression,
    clock: Arc<dyn Clock>,
    token: CancellationToken,
    fire: F,
) where
    F: Fn(&str) -> bool + Send + 'static,
{
    tokio::spawn(async move {
        let mut cursor = clock.now();
        loop {
            let Some(next) = expression.next_after(&cursor) else {
                debug!("Cron expression {} has no upcoming fire time", expression);
                break;
            };
            let delay = (next - clock.now()).to_std().unwrap_or(Duration::ZERO);
            trace!("Job {} next tick at {} (in {:?})", job_id, next, delay);

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            if token.is_cancelled() || !fire(&job_id) {
                break;
            }
            cursor = next.max(clock.now());
        }
        trace!("Cron loop for job {} stopped", job_id);
    });
}

/// Spawn `task` after `delay` unless `token` is cancelled first.
pub fn spawn_delayed<Fut>(delay: Duration, token: CancellationToken, task: Fut)
where
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(delay) => task.await,
        }
    });
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
