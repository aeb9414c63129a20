//! Dashboard configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use fems_client::ClientConfig;

use crate::Result;

/// The one environment-supplied setting: the backend base URL.
pub const API_URL_ENV: &str = "FEMS_API_URL";
/// Local development backend.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// REST backend base URL, e.g. `https://farm.example.com/api`
    pub api_base_url: String,
    /// Path to the local storage database file
    pub database_path: PathBuf,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            database_path: data_dir.join("fems.db"),
        }
    }

    /// Default config with the base URL taken from `FEMS_API_URL` if set.
    pub fn from_env() -> Self {
        Self::default().with_api_base_url(resolve_api_url(std::env::var(API_URL_ENV).ok()))
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Validated client settings.
    pub fn client_config(&self) -> Result<ClientConfig> {
        Ok(ClientConfig::new(&self.api_base_url)?)
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("fems"))
            .unwrap_or_else(|| PathBuf::from(".fems"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

fn resolve_api_url(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}
