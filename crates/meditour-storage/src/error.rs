//! Storage error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid cookie string: {0}")]
    InvalidCookie(String),
}
