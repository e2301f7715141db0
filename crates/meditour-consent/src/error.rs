//! Consent error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsentError {
    #[error("Storage error: {0}")]
    Storage(#[from] meditour_storage::StorageError),

    #[error("Malformed consent state: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Consent cookie is not valid percent-encoded UTF-8")]
    Encoding,
}
