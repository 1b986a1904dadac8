//! Common error types for the contracting bridge

use thiserror::Error;

/// Common result type for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across bridge crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored or received JSON could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for storage failures worth retrying: I/O, pool exhaustion and
    /// SQLite lock contention.
    pub fn is_transient_storage(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Io(_)) | Error::Database(sqlx::Error::PoolTimedOut) => true,
            Error::Database(db_err) => {
                let message = db_err.to_string();
                message.contains("database is locked") || message.contains("database is busy")
            }
            Error::Io(_) => true,
            _ => false,
        }
    }
}
