//! Database error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error from rusqlite.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database file does not exist.
    #[error("Database not found at '{0}'")]
    NotFound(PathBuf),

    /// A stored value could not be converted to its typed form.
    #[error("Invalid value in column '{column}': {reason}")]
    Decode { column: String, reason: String },

    /// The database lock was poisoned.
    #[error("Database lock poisoned")]
    LockPoisoned,
}
