//! Job, execution and worker handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use cadence_scheduler::{JobExecution, JobPatch, JobView, NewJob, PendingRetry, WorkerMachine};

use crate::error::ApiError;
use crate::state::AppState;

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response for a job update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobUpdateResponse {
    pub message: String,
    pub job: JobView,
}

/// Query for the execution list.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionQuery {
    pub job_id: Option<String>,
}

/// GET /api/jobs
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<Vec<JobView>> {
    Json(state.scheduler.list_jobs())
}

/// GET /api/jobs/{id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobView>, ApiError> {
    state
        .scheduler
        .get_job(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {}", id)))
}

/// POST /api/jobs
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewJob>, JsonRejection>,
) -> Result<(StatusCode, Json<JobView>), ApiError> {
    let Json(new_job) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let job = state.scheduler.create_job(new_job)?;
    info!("Created job {} ({})", job.definition.name, job.id());
    Ok((StatusCode::CREATED, Json(job)))
}

/// PUT /api/jobs/{id}
pub async fn update_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<JobPatch>, JsonRejection>,
) -> Result<Json<JobUpdateResponse>, ApiError> {
    let Json(patch) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let job = state.scheduler.update_job(&id, patch)?;
    Ok(Json(JobUpdateResponse {
        message: "Job updated successfully".to_string(),
        job,
    }))
}

/// DELETE /api/jobs/{id}
pub async fn delete_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.scheduler.delete_job(&id) {
        return Err(ApiError::NotFound(format!("Job not found: {}", id)));
    }
    Ok(Json(MessageResponse::new("Job deleted successfully")))
}

/// POST /api/jobs/{id}/execute
///
/// Returns once the dispatch is spawned, not when the attempt finishes.
pub async fn execute_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.scheduler.trigger_job(&id)?;
    Ok(Json(MessageResponse::new("Job execution triggered")))
}

/// GET /api/executions
pub async fn list_executions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExecutionQuery>,
) -> Json<Vec<JobExecution>> {
    Json(state.scheduler.list_executions(query.job_id.as_deref()))
}

/// GET /api/workers
pub async fn list_workers(State(state): State<Arc<AppState>>) -> Json<Vec<WorkerMachine>> {
    Json(state.scheduler.list_workers())
}

/// GET /api/retries
pub async fn list_retries(State(state): State<Arc<AppState>>) -> Json<Vec<PendingRetry>> {
    Json(state.scheduler.pending_retries())
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
