//! Marketplace endpoints beyond plain wholesaler CRUD

use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;

use crate::client::{encode_payload, ApiClient, ApiResult};
use crate::request::RequestDescriptor;
use crate::resource::{list_request, ListPage, Resource, ResourceKind};

const TRANSACTIONS_PATH: &str = "/wholeseller/transactions/";
const OFFERS_PATH: &str = "/wholeseller/wholesaler-crops/";
const SUPPLY_REQUESTS_PATH: &str = "/wholeseller/supply-requests/";

#[derive(Clone)]
pub struct WholesalerApi {
    client: ApiClient,
}

impl WholesalerApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn directory(&self) -> Resource {
        self.client.resource(ResourceKind::Wholesalers)
    }

    pub async fn get_all(&self, params: &[(&str, &str)]) -> ApiResult<Value> {
        self.directory().get_all(params).await
    }

    pub async fn list(&self, params: &[(&str, &str)]) -> ApiResult<ListPage> {
        self.directory().list(params).await
    }

    pub async fn get_by_id(&self, id: impl Display) -> ApiResult<Value> {
        self.directory().get_by_id(id).await
    }

    pub async fn transactions(&self, params: &[(&str, &str)]) -> ApiResult<Value> {
        self.client
            .request(list_request(TRANSACTIONS_PATH, params))
            .await
    }

    pub async fn create_transaction<T>(&self, payload: &T) -> ApiResult<Value>
    where
        T: Serialize + ?Sized,
    {
        let body = encode_payload(payload)?;
        self.client
            .request(RequestDescriptor::post(TRANSACTIONS_PATH, body))
            .await
    }

    /// Crops wholesalers are currently offering to buy.
    pub async fn offers(&self, params: &[(&str, &str)]) -> ApiResult<Value> {
        self.client.request(list_request(OFFERS_PATH, params)).await
    }

    pub async fn supply_requests(&self, params: &[(&str, &str)]) -> ApiResult<Value> {
        self.client
            .request(list_request(SUPPLY_REQUESTS_PATH, params))
            .await
    }

    pub async fn create_supply_request<T>(&self, payload: &T) -> ApiResult<Value>
    where
        T: Serialize + ?Sized,
    {
        let body = encode_payload(payload)?;
        self.client
            .request(RequestDescriptor::post(SUPPLY_REQUESTS_PATH, body))
            .await
    }
}
