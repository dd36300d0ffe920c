// ABOUTME: Errors returned by the rokka API client.
// ABOUTME: Non-success statuses carry the message decoded from the API error body.

use crate::transport::TransportError;
use serde::Deserialize;
use thiserror::Error;

/// Errors from API calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No API key configured.
    #[error("API key must be set (use `rokka login`, --api-key or ROKKA_API_KEY)")]
    MissingApiKey,

    /// The API answered with a status >= 400.
    #[error("{}", status_message(.code, .message))]
    Status { code: u16, message: Option<String> },

    /// The request could not be assembled.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] hyper::http::Error),

    /// The body could not be encoded or the response could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request never produced a response, even after retrying.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Reading a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn status_message(code: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => format!("rokka: status code {code} ({message})"),
        None => format!("rokka: status code {code}"),
    }
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    MissingApiKey,
    Status,
    InvalidRequest,
    Decode,
    Transport,
    Io,
}

impl ClientError {
    pub fn kind(&self) -> ClientErrorKind {
        match self {
            ClientError::MissingApiKey => ClientErrorKind::MissingApiKey,
            ClientError::Status { .. } => ClientErrorKind::Status,
            ClientError::InvalidRequest(_) => ClientErrorKind::InvalidRequest,
            ClientError::Decode(_) => ClientErrorKind::Decode,
            ClientError::Transport(_) => ClientErrorKind::Transport,
            ClientError::Io(_) => ClientErrorKind::Io,
        }
    }

    /// HTTP status of an API error response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Error body returned by the API: `{"error": {"code": 404, "message": "..."}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub message: String,
}

impl ClientError {
    /// Build a status error, decoding the API error body when possible.
    pub(crate) fn from_status(code: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ApiErrorBody>(body)
            .ok()
            .map(|b| b.error.message);
        ClientError::Status { code, message }
    }
}
