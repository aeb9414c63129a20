//! FEMS API Client
//!
//! Session-aware access to the farm-management REST backend:
//! - `Dispatcher` builds requests and attaches the stored token
//! - `interpret` turns every response, or transport failure, into one `Outcome`
//! - `SessionExpiry` logs the whole application out on any 401/403
//! - `Resource`, `AuthApi` and `WholesalerApi` map pages onto the backend

mod auth;
mod client;
mod config;
mod dispatcher;
mod error;
mod expiry;
mod interpreter;
mod request;
mod resource;
mod transport;
mod wholesaler;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use auth::AuthApi;
pub use client::{ApiClient, ApiResult};
pub use config::{ClientConfig, DEFAULT_AUTH_HEADER};
pub use dispatcher::Dispatcher;
pub use error::{ClientError, TransportError};
pub use expiry::{
    NavigationChannel, Navigator, SessionEnd, SessionExpiry, SessionListener, SIGN_IN_ROUTE,
};
pub use interpreter::{
    decode_body, interpret, ApiFailure, FailureKind, Outcome, FALLBACK_MESSAGE, NETWORK_MESSAGE,
};
pub use request::{HttpRequest, Method, RawResponse, RequestDescriptor};
pub use resource::{ListPage, Resource, ResourceKind};
pub use transport::{ReqwestTransport, Transport};
pub use wholesaler::WholesalerApi;

pub type Result<T> = std::result::Result<T, ClientError>;
