//! Repository Module
//!
//! CRUD operations over the SQLite tables, as free functions taking a pool.

// Auth
pub mod user;

// Learning content
pub mod module;
pub mod module_page;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Optimistic-lock mismatch: the row changed since the caller last read it
    #[error("Version conflict: {0}")]
    VersionConflict(String),

    /// A referenced row exists but belongs to a different parent
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
