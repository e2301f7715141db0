//! Cookie manager error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CookieError {
    #[error("Storage error: {0}")]
    Storage(#[from] meditour_storage::StorageError),

    #[error("Cookie value serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
