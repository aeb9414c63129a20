//! Dashboard state container
//!
//! Owns storage, the session and the API client. Pages borrow what they
//! need from here instead of reaching for globals.

use futures_util::future;
use std::sync::Arc;

use fems_client::{
    ApiClient, AuthApi, NavigationChannel, Navigator, ReqwestTransport, Resource, ResourceKind,
    Transport, WholesalerApi, SIGN_IN_ROUTE,
};
use fems_session::{Session, SessionStore};
use fems_storage::Database;

use crate::config::Config;
use crate::overview::{MarketBoard, Overview};
use crate::Result;

pub struct Dashboard {
    /// Configuration
    config: Config,
    /// Session store, shared with the client
    session: SessionStore,
    /// Session-aware API client
    client: ApiClient,
    /// Route changes requested by the client core
    navigation: NavigationChannel,
}

impl Dashboard {
    /// Open local storage, restore the session and connect to the backend.
    pub fn new(config: Config) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        Self::with_parts(config, db, Arc::new(ReqwestTransport::new()))
    }

    /// Assemble from an already opened database and a transport.
    pub fn with_parts(config: Config, db: Database, transport: Arc<dyn Transport>) -> Result<Self> {
        let client_config = config.client_config()?;
        let session = SessionStore::open(db)?;
        let navigation = NavigationChannel::new();
        let navigator: Arc<dyn Navigator> = Arc::new(navigation.clone());
        let client = ApiClient::new(client_config, session.clone(), transport, navigator);

        tracing::info!(
            api_base_url = %config.api_base_url,
            authenticated = session.is_authenticated(),
            "Dashboard initialized"
        );

        Ok(Self {
            config,
            session,
            client,
            navigation,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn navigation(&self) -> &NavigationChannel {
        &self.navigation
    }

    pub fn auth(&self) -> AuthApi {
        self.client.auth()
    }

    pub fn resource(&self, kind: ResourceKind) -> Resource {
        self.client.resource(kind)
    }

    pub fn wholesalers(&self) -> WholesalerApi {
        self.client.wholesalers()
    }

    /// Guard for protected pages, checked before any network call.
    ///
    /// Redirects to sign-in and returns `None` when there is no token.
    pub fn require_session(&self) -> Option<Session> {
        let session = self.session.snapshot();
        if session.is_authenticated() {
            Some(session)
        } else {
            self.navigation.navigate(SIGN_IN_ROUTE);
            None
        }
    }

    /// Plots, crops, crop plans and tasks, fetched concurrently.
    pub async fn load_overview(&self) -> Overview {
        let plots = self.resource(ResourceKind::Plots);
        let crops = self.resource(ResourceKind::Crops);
        let crop_plans = self.resource(ResourceKind::CropPlans);
        let tasks = self.resource(ResourceKind::Tasks);

        let (plots, crops, crop_plans, tasks) = future::join4(
            plots.list(&[]),
            crops.list(&[]),
            crop_plans.list(&[]),
            tasks.list(&[]),
        )
        .await;

        let overview = Overview {
            plots,
            crops,
            crop_plans,
            tasks,
        };
        for (label, failure) in overview.failures() {
            tracing::warn!(resource = label, status = ?failure.status, "Overview fetch failed");
        }
        overview
    }

    /// Wholesalers, market prices and crops, fetched concurrently.
    pub async fn load_market_board(&self) -> MarketBoard {
        let wholesalers = self.wholesalers();
        let prices = self.resource(ResourceKind::MarketPrices);
        let crops = self.resource(ResourceKind::Crops);

        let (wholesalers, market_prices, crops) =
            future::join3(wholesalers.list(&[]), prices.list(&[]), crops.list(&[])).await;

        let board = MarketBoard {
            wholesalers,
            market_prices,
            crops,
        };
        for (label, failure) in board.failures() {
            tracing::warn!(resource = label, status = ?failure.status, "Market board fetch failed");
        }
        board
    }
}

impl Clone for Dashboard {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            session: self.session.clone(),
            client: self.client.clone(),
            navigation: self.navigation.clone(),
        }
    }
}
