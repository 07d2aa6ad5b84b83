//! Unit-of-work execution.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::RunnerError;

/// Runs a job's command and returns its output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str) -> Result<String, RunnerError>;
}

/// Treats the command as a URL and fetches it with `GET`.
///
/// Non-2xx responses are failures carrying the status and body. The client
/// has no request timeout.
#[derive(Debug, Clone)]
pub struct HttpCommandRunner {
    client: Client,
}

impl HttpCommandRunner {
    pub fn new() -> Result<Self, RunnerError> {
        let client = Client::builder()
            .user_agent(concat!("cadence/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RunnerError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CommandRunner for HttpCommandRunner {
    async fn run(&self, command: &str) -> Result<String, RunnerError> {
        let request_error = |e: reqwest::Error| RunnerError::Request {
            command: command.to_string(),
            reason: e.to_string(),
        };

        debug!("Fetching {}", command);
        let response = self
            .client
            .get(command)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        let body = response.text().await.map_err(request_error)?;

        if !status.is_success() {
            return Err(RunnerError::Status {
                command: command.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
