//! Backend location and header policy

use url::Url;

use crate::error::ClientError;
use crate::Result;

/// Header carrying the raw token. The backend expects no `Bearer` prefix.
pub const DEFAULT_AUTH_HEADER: &str = "Authorization";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL without a trailing slash
    base_url: String,
    /// Name of the header the token is sent in
    auth_header: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            return Err(ClientError::InvalidBaseUrl("base URL is empty".to_string()));
        }

        let parsed = Url::parse(trimmed)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidBaseUrl(format!(
                "unsupported scheme: {}",
                parsed.scheme()
            )));
        }

        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_string(),
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
        })
    }

    pub fn with_auth_header(mut self, name: impl Into<String>) -> Self {
        self.auth_header = name.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth_header(&self) -> &str {
        &self.auth_header
    }

    /// Join an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        let path = path.trim();
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_paths() {
        let config = ClientConfig::new("http://localhost:8000/api/").unwrap();
        assert_eq!(config.base_url(), "http://localhost:8000/api");
        assert_eq!(
            config.endpoint("/crop/tasks/"),
            "http://localhost:8000/api/crop/tasks/"
        );
        assert_eq!(
            config.endpoint("crop/tasks/"),
            "http://localhost:8000/api/crop/tasks/"
        );
    }

    #[test]
    fn test_rejects_bad_base_urls() {
        assert!(matches!(
            ClientConfig::new("   "),
            Err(ClientError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            ClientConfig::new("not a url"),
            Err(ClientError::Url(_))
        ));
        assert!(matches!(
            ClientConfig::new("ftp://example.com/api"),
            Err(ClientError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_auth_header_defaults_and_overrides() {
        let config = ClientConfig::new("https://fems.example.com/api").unwrap();
        assert_eq!(config.auth_header(), "Authorization");

        let config = config.with_auth_header("X-Fems-Token");
        assert_eq!(config.auth_header(), "X-Fems-Token");
    }
}
