//! # Cadence Config
//!
//! Configuration management for the Cadence scheduler: TOML loading with
//! `${VAR}` expansion, typed schema with defaults, and validation.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
