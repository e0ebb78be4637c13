//! Error types for chat operations.

use std::time::Duration;

use reqwest::StatusCode;

/// Every way the outbound call can fail. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum TransportFailure {
    /// The endpoint answered with a non-2xx status.
    #[error("endpoint returned {0}")]
    Status(StatusCode),
    /// The call exceeded the configured upper bound.
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// Connection, DNS or TLS failure.
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),
    /// A 2xx response whose body was not the expected JSON.
    #[error("could not decode response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Result of a controller operation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("question must not be empty")]
    EmptyQuestion,
    #[error("there is no unanswered question to retry")]
    NothingToRetry,
    #[error(transparent)]
    Transport(#[from] TransportFailure),
}

impl ApiError {
    /// Whether the failure came from the remote call rather than local validation.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
