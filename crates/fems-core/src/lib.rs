//! FEMS Core
//!
//! Composition root for the farm-management dashboard: configuration,
//! logging, and the page-level loaders built on the session-aware client.

mod config;
mod dashboard;
mod error;
mod overview;

pub use config::{Config, API_URL_ENV, DEFAULT_API_URL};
pub use dashboard::Dashboard;
pub use error::CoreError;
pub use overview::{MarketBoard, Overview};

// Re-export core components
pub use fems_client::{
    ApiClient, ApiFailure, ApiResult, AuthApi, ClientConfig, ClientError, FailureKind, ListPage,
    NavigationChannel, Navigator, Resource, ResourceKind, SessionEnd, SessionListener,
    WholesalerApi, SIGN_IN_ROUTE,
};
pub use fems_session::{Profile, Session, SessionError, SessionStore};
pub use fems_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A subscriber installed by the host wins
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
