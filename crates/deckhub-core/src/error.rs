//! Error types for deckhub-core

use thiserror::Error;

/// Result type alias using deckhub-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in deckhub-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced card, deck, folder, or user does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Cross-user reference, e.g. a parent folder owned by a different user
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Structural constraint violation, e.g. deleting a non-empty folder
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed input such as a non-positive quantity or a cyclic re-parent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// External card catalog unreachable or returning errors
    #[error("Catalog unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Unexpected database state (bad row shape, missing column)
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is a `SQLite` UNIQUE constraint violation.
    ///
    /// The card resolver relies on this to recover the first-reference race
    /// on `cards.external_id`, and the user store maps it to [`Error::Conflict`]
    /// for duplicate emails.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::LibSql(err) => err.to_string().contains("UNIQUE constraint failed"),
            _ => false,
        }
    }
}
