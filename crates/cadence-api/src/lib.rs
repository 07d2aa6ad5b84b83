//! # Cadence API
//!
//! REST interface over a [`cadence_scheduler::JobScheduler`].
//!
//! ```text
//! /api/jobs                 GET, POST
//! /api/jobs/{id}            GET, PUT, DELETE
//! /api/jobs/{id}/execute    POST (fire-and-forget)
//! /api/executions?jobId=    GET
//! /api/workers              GET
//! /api/retries              GET
//! /health                   GET
//! /livez                    GET
//! ```

pub mod error;
pub mod http;
pub mod server;
pub mod state;

pub use error::{ApiError, ErrorResponse};
pub use http::routes::create_router;
pub use server::{ApiServer, InterfaceConfig};
pub use state::AppState;
