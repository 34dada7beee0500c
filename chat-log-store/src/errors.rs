//! Unified error types for the crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Top-level error for log-store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Local SQLite errors (open, prepare, execute).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Blocking task panicked or was cancelled.
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Transport error talking to the remote database.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote database rejected the request.
    #[error("remote database error (status {status}): {message}")]
    Remote { status: u16, message: String },

    /// A stored value could not be turned back into a record.
    #[error("decode error: {0}")]
    Decode(String),
}
