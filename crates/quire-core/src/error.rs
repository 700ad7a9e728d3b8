//! Error types for quire.

use thiserror::Error;

/// Result type alias using quire's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for quire operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(uuid::Uuid),

    /// Tag not found
    #[error("Tag not found: {0}")]
    TagNotFound(i64),

    /// User not found
    #[error("User not found: {0}")]
    UserNotFound(uuid::Uuid),

    /// Invalid input (failed boundary validation)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Duplicate unique key (email, tag name)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Tag deletion rejected while notes still reference it
    #[error(
        "Cannot delete tag \"{name}\" because it is used by {note_count} note(s). Remove the tag from those notes first."
    )]
    TagInUse { name: String, note_count: i64 },

    /// Import source could not be read; the file is skipped
    #[error("Unreadable source {path}: {reason}")]
    UnreadableSource { path: String, reason: String },

    /// No user available to attribute an import batch to
    #[error("Missing actor: {0}")]
    MissingActor(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (authenticated but not authorized)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Translate a unique-constraint violation into [`Error::Conflict`].
    ///
    /// Any other database error is wrapped unchanged.
    pub fn from_unique_violation(err: sqlx::Error, message: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Error::Conflict(message.to_string())
            }
            _ => Error::Database(err),
        }
    }

    /// Whether this error is a "not found" outcome of any kind.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::NoteNotFound(_)
                | Error::TagNotFound(_)
                | Error::UserNotFound(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
