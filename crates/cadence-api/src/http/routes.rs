//! HTTP route definitions.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::http::monitoring;
use crate::state::AppState;

/// Create the main router.
///
/// ## Route Structure
///
/// ```text
/// /api/jobs
///   GET    /api/jobs              - List jobs
///   POST   /api/jobs              - Create job
///   GET    /api/jobs/{id}         - Get job
///   PUT    /api/jobs/{id}         - Update job
///   DELETE /api/jobs/{id}         - Delete job
///   POST   /api/jobs/{id}/execute - Trigger job now
///
/// /api/executions?jobId=          - Execution history
/// /api/workers                    - Worker status
/// /api/retries                    - Pending retries
///
/// /health - Scheduler summary
/// /livez  - Liveness probe
/// ```
pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route(
            "/api/jobs",
            get(handlers::list_jobs).post(handlers::create_job),
        )
        .route(
            "/api/jobs/{id}",
            get(handlers::get_job)
                .put(handlers::update_job)
                .delete(handlers::delete_job),
        )
        .route("/api/jobs/{id}/execute", post(handlers::execute_job))
        .route("/api/executions", get(handlers::list_executions))
        .route("/api/workers", get(handlers::list_workers))
        .route("/api/retries", get(handlers::list_retries))
        .with_state(state.clone());

    let monitoring_routes = Router::new()
        .route("/health", get(monitoring::health_check))
        .with_state(state);

    // Liveness probe has no state dependency
    let liveness_route = Router::new().route("/livez", get(monitoring::liveness_probe));

    Router::new()
        .merge(api_routes)
        .merge(monitoring_routes)
        .merge(liveness_route)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
