//! Scripted transport for tests
//!
//! Routes are matched on method and path, with the base URL and query string
//! stripped. Unmatched requests get a 404.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::TransportError;
use crate::request::{HttpRequest, Method, RawResponse};
use crate::transport::Transport;

#[derive(Debug, Clone)]
enum Reply {
    Response(RawResponse),
    Error(TransportError),
}

#[derive(Debug, Clone)]
struct MockRoute {
    reply: Reply,
    delay: Option<Duration>,
}

#[derive(Debug)]
pub struct MockTransport {
    base_url: String,
    routes: Mutex<HashMap<(Method, String), MockRoute>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            routes: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn insert(&self, method: Method, path: &str, reply: Reply) {
        self.routes.lock().insert(
            (method, path.to_string()),
            MockRoute { reply, delay: None },
        );
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.insert(method, path, Reply::Response(RawResponse::json(status, &body)));
    }

    pub fn respond_raw(&self, method: Method, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.insert(method, path, Reply::Response(RawResponse::new(status, body)));
    }

    pub fn fail(&self, method: Method, path: &str, error: TransportError) {
        self.insert(method, path, Reply::Error(error));
    }

    /// Hold the reply for an already registered route.
    pub fn delay(&self, method: Method, path: &str, delay: Duration) {
        if let Some(route) = self.routes.lock().get_mut(&(method, path.to_string())) {
            route.delay = Some(delay);
        }
    }

    /// Every request received, in arrival order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    fn route_path<'a>(&self, url: &'a str) -> &'a str {
        let path = url.strip_prefix(self.base_url.as_str()).unwrap_or(url);
        path.split('?').next().unwrap_or(path)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let key = (request.method, self.route_path(&request.url).to_string());
        self.requests.lock().push(request);

        let route = self.routes.lock().get(&key).cloned();
        let Some(route) = route else {
            return Ok(RawResponse::json(
                404,
                &json!({"message": format!("no mock route for {} {}", key.0, key.1)}),
            ));
        };

        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }

        match route.reply {
            Reply::Response(response) => Ok(response),
            Reply::Error(error) => Err(error),
        }
    }
}
