// ABOUTME: Transport error types with SNAFU pattern.
// ABOUTME: Separates transient send failures from the terminal retry exhaustion error.

use snafu::Snafu;

/// Boxed cause of a failed HTTP attempt.
pub type SendFailure = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised below the API client, while moving bytes over HTTP.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TransportError {
    #[snafu(display("failed to build HTTP client: {source}"))]
    Build { source: reqwest::Error },

    /// Connection refused, timeout, DNS failure and the like.
    #[snafu(display("request failed: {source}"))]
    Request { source: SendFailure },

    /// The retry budget is spent. `last_error` is `None` when the final
    /// attempt returned a retryable status rather than failing outright.
    #[snafu(display(
        "max retries reached after {attempts} attempt(s){}",
        last_error
            .as_ref()
            .map(|e| format!(", last error: {e}"))
            .unwrap_or_default()
    ))]
    MaxRetriesReached {
        attempts: u32,
        last_error: Option<Box<TransportError>>,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The underlying HTTP client could not be constructed.
    Build,
    /// A single attempt failed before a response arrived.
    Transient,
    /// Every attempt failed or returned a retryable status.
    MaxRetriesReached,
}

impl TransportError {
    /// Wrap any error as a transient request failure.
    pub fn request(source: impl Into<SendFailure>) -> Self {
        TransportError::Request {
            source: source.into(),
        }
    }

    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            TransportError::Build { .. } => TransportErrorKind::Build,
            TransportError::Request { .. } => TransportErrorKind::Transient,
            TransportError::MaxRetriesReached { .. } => TransportErrorKind::MaxRetriesReached,
        }
    }

    /// Returns the cause carried by a `MaxRetriesReached` error, if any.
    pub fn last_error(&self) -> Option<&TransportError> {
        match self {
            TransportError::MaxRetriesReached { last_error, .. } => last_error.as_deref(),
            _ => None,
        }
    }
}
