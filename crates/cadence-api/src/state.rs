//! Application state.

use std::time::Instant;

use cadence_scheduler::JobScheduler;

/// Application state shared across handlers.
pub struct AppState {
    pub scheduler: JobScheduler,
    start_time: Instant,
}

impl AppState {
    pub fn new(scheduler: JobScheduler) -> Self {
        Self {
            scheduler,
            start_time: Instant::now(),
        }
    }

    /// Get uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
