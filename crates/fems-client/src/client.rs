//! API client
//!
//! Ties dispatcher, interpreter and session listeners together. Every page
//! goes through `request`, so the 401/403 policy holds everywhere.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use fems_session::SessionStore;

use crate::auth::AuthApi;
use crate::config::ClientConfig;
use crate::dispatcher::Dispatcher;
use crate::expiry::{Navigator, SessionEnd, SessionExpiry, SessionListener};
use crate::interpreter::{interpret, ApiFailure, Outcome};
use crate::request::RequestDescriptor;
use crate::resource::{Resource, ResourceKind};
use crate::transport::{ReqwestTransport, Transport};
use crate::wholesaler::WholesalerApi;

pub type ApiResult<T> = std::result::Result<T, ApiFailure>;

pub struct ApiClient {
    dispatcher: Arc<Dispatcher>,
    /// Notified when the session ends, in registration order
    listeners: Arc<RwLock<Vec<Arc<dyn SessionListener>>>>,
}

impl ApiClient {
    /// Build a client with the standard expiry policy wired to `navigator`.
    pub fn new(
        config: ClientConfig,
        session: SessionStore,
        transport: Arc<dyn Transport>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let expiry = SessionExpiry::new(session.clone(), navigator);
        let client = Self {
            dispatcher: Arc::new(Dispatcher::new(config, session, transport)),
            listeners: Arc::new(RwLock::new(Vec::new())),
        };
        client.subscribe(Arc::new(expiry));
        client
    }

    pub fn with_reqwest(
        config: ClientConfig,
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::new(config, session, Arc::new(ReqwestTransport::new()), navigator)
    }

    /// Register an extra listener for session end events.
    pub fn subscribe(&self, listener: Arc<dyn SessionListener>) {
        self.listeners.write().push(listener);
    }

    pub fn session(&self) -> &SessionStore {
        self.dispatcher.session()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub(crate) fn end_session(&self, event: SessionEnd<'_>) {
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.on_session_end(event);
        }
    }

    pub async fn request(&self, descriptor: RequestDescriptor) -> ApiResult<Value> {
        let raw = self.dispatcher.send(&descriptor).await;

        match interpret(raw) {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(failure) => {
                tracing::debug!(
                    method = %descriptor.method,
                    path = %descriptor.path,
                    status = ?failure.status,
                    kind = ?failure.kind,
                    "Request failed"
                );
                if failure.is_unauthorized() {
                    self.end_session(SessionEnd::Unauthorized(&failure));
                }
                Err(failure)
            }
        }
    }

    /// Like `request`, then decode the success payload into `T`.
    pub async fn request_as<T>(&self, descriptor: RequestDescriptor) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let path = descriptor.path.clone();
        let value = self.request(descriptor).await?;
        serde_json::from_value(value).map_err(|e| {
            tracing::debug!(path = %path, "Unexpected response shape: {}", e);
            ApiFailure::local(format!("Unexpected response from {}: {}", path, e))
        })
    }

    pub fn resource(&self, kind: ResourceKind) -> Resource {
        Resource::new(self.clone(), kind)
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    pub fn wholesalers(&self) -> WholesalerApi {
        WholesalerApi::new(self.clone())
    }
}

impl Clone for ApiClient {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            listeners: Arc::clone(&self.listeners),
        }
    }
}

pub(crate) fn encode_payload<T>(payload: &T) -> ApiResult<Value>
where
    T: Serialize + ?Sized,
{
    serde_json::to_value(payload)
        .map_err(|e| ApiFailure::local(format!("Could not encode request body: {}", e)))
}
