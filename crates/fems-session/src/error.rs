//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(#[from] fems_storage::StorageError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No active session")]
    NotAuthenticated,

    #[error("Session changed since it was read")]
    SessionChanged,

    #[error("Token cannot be empty")]
    EmptyToken,
}
