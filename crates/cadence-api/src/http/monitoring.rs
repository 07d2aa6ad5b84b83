//! Health check handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use cadence_scheduler::ExecutionStatus;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub jobs: usize,
    pub scheduled_jobs: usize,
    pub running_executions: usize,
    pub pending_retries: usize,
}

/// Health summary of the scheduler.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let scheduler = &state.scheduler;
    let running = scheduler
        .list_executions(None)
        .iter()
        .filter(|e| e.status == ExecutionStatus::Running)
        .count();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        jobs: scheduler.list_jobs().len(),
        scheduled_jobs: scheduler.scheduled_job_ids().len(),
        running_executions: running,
        pending_retries: scheduler.pending_retries().len(),
    })
}

/// Liveness probe.
pub async fn liveness_probe() -> &'static str {
    "OK"
}
