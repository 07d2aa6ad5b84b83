//! HTTP interface module.
//!
//! Provides REST endpoints for:
//! - Job management and manual triggers
//! - Execution history and worker status
//! - Health checks

pub mod handlers;
pub mod routes;

pub(crate) mod monitoring;
