//! Error types for Krepsys.

use thiserror::Error;

/// Common error type for Krepsys.
#[derive(Error, Debug)]
pub enum KrepsysError {
    /// Database error.
    ///
    /// This is a generic database error that wraps errors from sqlx.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Conflict with an existing resource (e.g. duplicate feed URL).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Feed source unreachable or the HTTP exchange failed.
    #[error("feed transport error: {0}")]
    FeedTransport(String),

    /// Feed document was fetched but could not be parsed.
    #[error("feed parse error: {0}")]
    FeedParse(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for KrepsysError {
    fn from(e: sqlx::Error) -> Self {
        KrepsysError::Database(e.to_string())
    }
}

/// Result type alias for Krepsys operations.
pub type Result<T> = std::result::Result<T, KrepsysError>;
