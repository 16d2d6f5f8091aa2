//! Remote data service error types.

use thiserror::Error;

/// Errors surfaced by the remote data service client.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("remote API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl RemoteError {
    /// Classify an HTTP error response by status code.
    ///
    /// The storage API reports key collisions as 409; PostgREST reports
    /// row conflicts the same way. 404s and auth failures get their own
    /// variants so callers can react without string matching.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::Unauthorized(message),
            404 => Self::NotFound(message),
            409 => Self::AlreadyExists(message),
            _ => Self::Api { status, message },
        }
    }

    /// Whether this error is an object-key collision (safe to retry under a
    /// different name).
    pub fn is_collision(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

/// Result type for remote operations.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;
