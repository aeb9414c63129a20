//! Network transports

use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::{HttpRequest, Method, RawResponse};

/// Executes one resolved request. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<RawResponse, TransportError>;
}

/// Production transport. No explicit timeout: the platform default applies.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .http
            .request(reqwest_method(request.method), request.url.as_str());

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                TransportError::InvalidRequest(e.to_string())
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        // A body that cannot be read is treated like an empty one so the
        // status still decides the outcome.
        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                tracing::debug!(status, "Failed to read response body: {}", e);
                Vec::new()
            }
        };

        Ok(RawResponse { status, body })
    }
}
