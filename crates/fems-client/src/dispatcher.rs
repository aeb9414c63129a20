//! Request Dispatcher
//!
//! Resolves a `RequestDescriptor` against the base URL and the current
//! session, then hands it to the transport. One call, one network request.

use std::sync::Arc;

use fems_session::SessionStore;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::request::{HttpRequest, RawResponse, RequestDescriptor};
use crate::transport::Transport;

const CONTENT_TYPE: &str = "Content-Type";
const JSON_MIME: &str = "application/json";

pub struct Dispatcher {
    config: ClientConfig,
    session: SessionStore,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(config: ClientConfig, session: SessionStore, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            session,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Build the outgoing request. Reads the token at call time.
    pub fn build(&self, descriptor: &RequestDescriptor) -> HttpRequest {
        let mut url = self.config.endpoint(&descriptor.path);
        if !descriptor.query.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(descriptor.query.iter())
                .finish();
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }

        let mut headers = vec![(CONTENT_TYPE.to_string(), JSON_MIME.to_string())];
        if let Some(token) = self.session.token() {
            headers.push((self.config.auth_header().to_string(), token));
        }
        for (name, value) in &descriptor.headers {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        let body = if descriptor.method.carries_body() {
            descriptor
                .body
                .as_ref()
                .map(|body| body.to_string().into_bytes())
        } else {
            if descriptor.body.is_some() {
                tracing::debug!(
                    method = %descriptor.method,
                    path = %descriptor.path,
                    "Dropping body for verb without one"
                );
            }
            None
        };

        HttpRequest {
            method: descriptor.method,
            url,
            headers,
            body,
        }
    }

    pub async fn send(&self, descriptor: &RequestDescriptor) -> Result<RawResponse, TransportError> {
        let request = self.build(descriptor);

        tracing::debug!(
            method = %request.method,
            path = %descriptor.path,
            authenticated = request.header(self.config.auth_header()).is_some(),
            "Dispatching request"
        );

        self.transport.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::request::Method;
    use fems_session::Profile;
    use fems_storage::Database;
    use serde_json::json;

    const BASE: &str = "http://localhost:8000/api";

    fn dispatcher() -> (Dispatcher, SessionStore) {
        let session = SessionStore::open(Database::open_in_memory().unwrap()).unwrap();
        let dispatcher = Dispatcher::new(
            ClientConfig::new(BASE).unwrap(),
            session.clone(),
            Arc::new(MockTransport::new(BASE)),
        );
        (dispatcher, session)
    }

    #[test]
    fn test_no_auth_header_without_token() {
        let (dispatcher, _) = dispatcher();
        let request = dispatcher.build(&RequestDescriptor::get("/crop/"));

        assert_eq!(request.url, "http://localhost:8000/api/crop/");
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.header("Authorization"), None);
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn test_token_is_sent_raw() {
        let (dispatcher, session) = dispatcher();
        session
            .establish("eyJ.jwt.sig", Profile::default())
            .unwrap();

        let request = dispatcher.build(&RequestDescriptor::get("/crop/"));
        assert_eq!(request.header("authorization"), Some("eyJ.jwt.sig"));

        session.clear_session().unwrap();
        let request = dispatcher.build(&RequestDescriptor::get("/crop/"));
        assert_eq!(request.header("Authorization"), None);
    }

    #[test]
    fn test_session_cleared_by_another_handle_is_not_sent() {
        let db = Database::open_in_memory().unwrap();
        let ours = SessionStore::open(db.clone()).unwrap();
        let theirs = SessionStore::open(db).unwrap();
        let dispatcher = Dispatcher::new(
            ClientConfig::new(BASE).unwrap(),
            ours.clone(),
            Arc::new(MockTransport::new(BASE)),
        );

        theirs.establish("shared-jwt", Profile::default()).unwrap();
        let request = dispatcher.build(&RequestDescriptor::get("/crop/"));
        assert_eq!(request.header("Authorization"), Some("shared-jwt"));

        theirs.clear_session().unwrap();
        assert!(!ours.is_authenticated());
        let request = dispatcher.build(&RequestDescriptor::get("/crop/"));
        assert_eq!(request.header("Authorization"), None);
    }

    #[test]
    fn test_query_string_is_encoded() {
        let (dispatcher, _) = dispatcher();
        let request = dispatcher.build(
            &RequestDescriptor::get("/crop/tasks/")
                .with_query(&[("status", "pending"), ("q", "rice & wheat")]),
        );

        assert_eq!(
            request.url,
            "http://localhost:8000/api/crop/tasks/?status=pending&q=rice+%26+wheat"
        );
    }

    #[test]
    fn test_overrides_replace_defaults() {
        let (dispatcher, session) = dispatcher();
        session.establish("tok", Profile::default()).unwrap();

        let request = dispatcher.build(
            &RequestDescriptor::get("/crop/")
                .with_header("content-type", "text/plain")
                .with_header("Accept-Language", "hi"),
        );

        assert_eq!(request.header("Content-Type"), Some("text/plain"));
        assert_eq!(request.header("Accept-Language"), Some("hi"));
        assert_eq!(request.header("Authorization"), Some("tok"));
        assert_eq!(
            request
                .headers
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case("content-type"))
                .count(),
            1
        );
    }

    #[test]
    fn test_body_only_for_body_verbs() {
        let (dispatcher, _) = dispatcher();
        let payload = json!({"name": "North field", "area": 2.5});

        let post = dispatcher.build(&RequestDescriptor::post("/plot/plots/", payload.clone()));
        let sent: serde_json::Value = serde_json::from_slice(post.body.as_ref().unwrap()).unwrap();
        assert_eq!(sent, payload);

        let delete = dispatcher.build(
            &RequestDescriptor::new(Method::Delete, "/plot/plots/1/").with_body(payload),
        );
        assert_eq!(delete.body, None);
    }

    #[test]
    fn test_custom_auth_header_name() {
        let session = SessionStore::open(Database::open_in_memory().unwrap()).unwrap();
        session.establish("tok", Profile::default()).unwrap();
        let dispatcher = Dispatcher::new(
            ClientConfig::new(BASE)
                .unwrap()
                .with_auth_header("X-Fems-Token"),
            session,
            Arc::new(MockTransport::new(BASE)),
        );

        let request = dispatcher.build(&RequestDescriptor::get("/crop/"));
        assert_eq!(request.header("X-Fems-Token"), Some("tok"));
        assert_eq!(request.header("Authorization"), None);
    }

    #[tokio::test]
    async fn test_send_performs_exactly_one_call() {
        let session = SessionStore::open(Database::open_in_memory().unwrap()).unwrap();
        let transport = Arc::new(MockTransport::new(BASE));
        transport.respond(Method::Get, "/crop/", 200, json!({"rows": []}));
        let dispatcher = Dispatcher::new(
            ClientConfig::new(BASE).unwrap(),
            session,
            transport.clone(),
        );

        let response = dispatcher
            .send(&RequestDescriptor::get("/crop/"))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(transport.requests().len(), 1);
    }
}
