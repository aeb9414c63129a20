//! Response Interpreter
//!
//! Pure classification of an exchange into `Outcome`. The session side
//! effect of an authorization failure lives in `expiry`, not here.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::TransportError;
use crate::request::RawResponse;

/// Message used when the backend gives none.
pub const FALLBACK_MESSAGE: &str = "An error occurred";
/// Message used when no response was received.
pub const NETWORK_MESSAGE: &str = "Unable to reach the server";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No response: DNS, refused connection, reset
    Transport,
    /// 401 or 403; ends the session
    Unauthorized,
    /// Any other non-2xx below 500
    Client,
    /// 5xx
    Server,
    /// Raised on this side of the wire: payload encoding, typed decoding,
    /// session persistence
    Local,
}

/// The single failure shape every caller handles.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ApiFailure {
    pub kind: FailureKind,
    /// HTTP status, absent when no response was received
    pub status: Option<u16>,
    pub message: String,
    /// Decoded error body, `{}` when there was none
    pub data: Value,
}

impl ApiFailure {
    pub fn transport(error: &TransportError) -> Self {
        tracing::debug!("Request did not complete: {}", error);
        Self {
            kind: FailureKind::Transport,
            status: None,
            message: NETWORK_MESSAGE.to_string(),
            data: Value::Object(Map::new()),
        }
    }

    pub fn local(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Local,
            status: None,
            message: message.into(),
            data: Value::Object(Map::new()),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == FailureKind::Unauthorized
    }

    /// Field-level validation errors, e.g. `{"name": ["This field is required."]}`.
    pub fn field_errors(&self) -> Option<&Map<String, Value>> {
        self.data.as_object().filter(|fields| !fields.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    Failure(ApiFailure),
}

impl Outcome {
    pub fn into_result(self) -> Result<Value, ApiFailure> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(failure) => Err(failure),
        }
    }
}

/// Decode a body as JSON; anything undecodable becomes `{}`.
pub fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Object(Map::new());
    }
    serde_json::from_slice(bytes).unwrap_or_else(|_| Value::Object(Map::new()))
}

fn classify(status: u16) -> Option<FailureKind> {
    match status {
        200..=299 => None,
        401 | 403 => Some(FailureKind::Unauthorized),
        500..=599 => Some(FailureKind::Server),
        _ => Some(FailureKind::Client),
    }
}

fn failure_message(data: &Value) -> String {
    ["message", "msg"]
        .iter()
        .find_map(|field| {
            data.get(*field)
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
        })
        .unwrap_or(FALLBACK_MESSAGE)
        .to_string()
}

pub fn interpret(result: Result<RawResponse, TransportError>) -> Outcome {
    let response = match result {
        Ok(response) => response,
        Err(error) => return Outcome::Failure(ApiFailure::transport(&error)),
    };

    let data = decode_body(&response.body);
    match classify(response.status) {
        None => Outcome::Success(data),
        Some(kind) => Outcome::Failure(ApiFailure {
            kind,
            status: Some(response.status),
            message: failure_message(&data),
            data,
        }),
    }
}
