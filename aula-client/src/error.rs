//! Client error types

use thiserror::Error;

/// Client-side error type
///
/// Version conflicts are a distinct kind so callers can prompt
/// "reload and retry" instead of showing a generic failure.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server error {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("version conflict: {0}")]
    VersionConflict(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("response decode error: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether the server rejected the write because of a stale version
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, ClientError::VersionConflict(_))
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
