//! Client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

/// Failure to complete an HTTP exchange at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
