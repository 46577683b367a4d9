//! Client error types

use std::time::Duration;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, UploadcareError>;

/// Client errors
#[derive(Error, Debug)]
pub enum UploadcareError {
    /// Network failure or malformed HTTP exchange
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credentials missing or rejected (401/403)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The API rejected the request (400/404)
    #[error("Invalid request ({status}): {body}")]
    InvalidRequest { status: u16, body: String },

    /// Still throttled (429) after the retry budget was spent
    #[error("Request throttled, retry after {retry_after:?}")]
    Throttled { retry_after: Option<Duration> },

    /// Any other non-success status
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL could not be built
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A caller-supplied argument is out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Upload failed
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// Waiting for a remote operation took too long
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl UploadcareError {
    /// Map a non-success response to an error
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Authentication(body),
            400 | 404 => Self::InvalidRequest { status, body },
            429 => Self::Throttled { retry_after: None },
            _ => Self::Api { status, body },
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::InvalidRequest { status: 404, .. })
    }

    /// Whether sending the same request again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Throttled { .. } => true,
            Self::Api { status, .. } => matches!(status, 502..=504),
            Self::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}
