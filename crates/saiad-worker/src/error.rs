//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Job timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Provider error: {0}")]
    Provider(#[from] saiad_providers::ProviderError),

    #[error("Queue error: {0}")]
    Queue(#[from] saiad_queue::QueueError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if the error is transient and worth retrying.
    ///
    /// Infrastructure errors retry outright; generic job failures are
    /// classified by message content, matching the failure text providers
    /// put in timeout and connection errors.
    pub fn is_transient(&self) -> bool {
        match self {
            WorkerError::Timeout(_) | WorkerError::Queue(_) => true,
            WorkerError::Provider(e) => matches!(
                e,
                saiad_providers::ProviderError::Timeout(_)
                    | saiad_providers::ProviderError::Connection(_)
            ),
            WorkerError::JobFailed(msg) => is_transient_message(msg),
            _ => false,
        }
    }
}

/// Message-content heuristic for transient failures.
pub fn is_transient_message(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    msg.contains("timeout") || msg.contains("connection")
}
