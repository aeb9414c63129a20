//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] fems_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] fems_session::SessionError),

    #[error("Client error: {0}")]
    Client(#[from] fems_client::ClientError),

    #[error("Configuration error: {0}")]
    Config(String),
}

// Filesystem failures only happen while preparing the data directory
impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Config(e.to_string())
    }
}
