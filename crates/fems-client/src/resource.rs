//! Resource facades
//!
//! One generic facade, parameterized by path prefix, covers every CRUD
//! family the backend exposes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;

use crate::client::{encode_payload, ApiClient, ApiResult};
use crate::request::RequestDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Crops,
    Plots,
    WaterResources,
    /// Crop-to-plot assignments shown on the planning page
    CropPlans,
    CropStocks,
    Machinery,
    Manpower,
    Fertilizers,
    Tasks,
    /// Knowledge library articles
    Library,
    MarketPrices,
    Wholesalers,
    Farmers,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 13] = [
        ResourceKind::Crops,
        ResourceKind::Plots,
        ResourceKind::WaterResources,
        ResourceKind::CropPlans,
        ResourceKind::CropStocks,
        ResourceKind::Machinery,
        ResourceKind::Manpower,
        ResourceKind::Fertilizers,
        ResourceKind::Tasks,
        ResourceKind::Library,
        ResourceKind::MarketPrices,
        ResourceKind::Wholesalers,
        ResourceKind::Farmers,
    ];

    /// Collection path, always with a trailing slash.
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Crops => "/crop/",
            ResourceKind::Plots => "/plot/plots/",
            ResourceKind::WaterResources => "/plot/water-resources/",
            ResourceKind::CropPlans => "/crop/crop-plots/",
            ResourceKind::CropStocks => "/crop/stocks/",
            ResourceKind::Machinery => "/crop/machinery/",
            ResourceKind::Manpower => "/crop/manpower/",
            ResourceKind::Fertilizers => "/crop/fertilizers/",
            ResourceKind::Tasks => "/crop/tasks/",
            ResourceKind::Library => "/crop/resources/",
            ResourceKind::MarketPrices => "/crop/market-prices/",
            ResourceKind::Wholesalers => "/wholeseller/wholesalers/",
            ResourceKind::Farmers => "/accounts/farmers/",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Crops => "crops",
            ResourceKind::Plots => "plots",
            ResourceKind::WaterResources => "water resources",
            ResourceKind::CropPlans => "crop plans",
            ResourceKind::CropStocks => "crop stocks",
            ResourceKind::Machinery => "machinery",
            ResourceKind::Manpower => "manpower",
            ResourceKind::Fertilizers => "fertilizers",
            ResourceKind::Tasks => "tasks",
            ResourceKind::Library => "library resources",
            ResourceKind::MarketPrices => "market prices",
            ResourceKind::Wholesalers => "wholesalers",
            ResourceKind::Farmers => "farmers",
        }
    }

    pub fn item_path(&self, id: impl Display) -> String {
        format!("{}{}/", self.path(), id)
    }
}

/// A list endpoint's `rows` envelope. Other envelope fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListPage {
    #[serde(default)]
    pub rows: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ListPage {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub(crate) fn list_request(path: &str, params: &[(&str, &str)]) -> RequestDescriptor {
    RequestDescriptor::get(path).with_query(params)
}

#[derive(Clone)]
pub struct Resource {
    client: ApiClient,
    kind: ResourceKind,
}

impl Resource {
    pub fn new(client: ApiClient, kind: ResourceKind) -> Self {
        Self { client, kind }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// List with optional filters, envelope passed through untouched.
    pub async fn get_all(&self, params: &[(&str, &str)]) -> ApiResult<Value> {
        self.client
            .request(list_request(self.kind.path(), params))
            .await
    }

    /// List and decode the `rows` envelope.
    pub async fn list(&self, params: &[(&str, &str)]) -> ApiResult<ListPage> {
        self.client
            .request_as(list_request(self.kind.path(), params))
            .await
    }

    pub async fn get_by_id(&self, id: impl Display) -> ApiResult<Value> {
        self.client
            .request(RequestDescriptor::get(self.kind.item_path(id)))
            .await
    }

    pub async fn create<T>(&self, payload: &T) -> ApiResult<Value>
    where
        T: Serialize + ?Sized,
    {
        let body = encode_payload(payload)?;
        self.client
            .request(RequestDescriptor::post(self.kind.path(), body))
            .await
    }

    pub async fn update<T>(&self, id: impl Display, payload: &T) -> ApiResult<Value>
    where
        T: Serialize + ?Sized,
    {
        let body = encode_payload(payload)?;
        self.client
            .request(RequestDescriptor::put(self.kind.item_path(id), body))
            .await
    }

    pub async fn delete(&self, id: impl Display) -> ApiResult<Value> {
        self.client
            .request(RequestDescriptor::delete(self.kind.item_path(id)))
            .await
    }
}
