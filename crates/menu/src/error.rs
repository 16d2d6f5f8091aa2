//! Menu repository error types.

use crema_core::ImageError;
use crema_remote::RemoteError;
use thiserror::Error;

/// Errors surfaced by menu repository operations.
#[derive(Debug, Error)]
pub enum MenuError {
    #[error("unauthorized: sign in first")]
    Unauthorized,

    #[error("invalid image: {0}")]
    Validation(#[from] ImageError),

    #[error("remote service error: {0}")]
    Remote(RemoteError),

    #[error("could not resolve a public URL for {0}")]
    UrlResolution(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<RemoteError> for MenuError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NotFound(what) => Self::NotFound(what),
            other => Self::Remote(other),
        }
    }
}

/// Result type for menu operations.
pub type MenuResult<T> = std::result::Result<T, MenuError>;
