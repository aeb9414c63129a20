//! Multi-resource page loads
//!
//! Each slot resolves on its own; one failed fetch never hides the others.

use fems_client::{ApiFailure, ApiResult, ListPage};

/// Home dashboard data.
#[derive(Debug, Clone)]
pub struct Overview {
    pub plots: ApiResult<ListPage>,
    pub crops: ApiResult<ListPage>,
    pub crop_plans: ApiResult<ListPage>,
    pub tasks: ApiResult<ListPage>,
}

impl Overview {
    pub fn failures(&self) -> Vec<(&'static str, &ApiFailure)> {
        collect_failures([
            ("plots", &self.plots),
            ("crops", &self.crops),
            ("crop plans", &self.crop_plans),
            ("tasks", &self.tasks),
        ])
    }

    /// Rows for a slot, empty when that fetch failed.
    pub fn rows_or_empty(slot: &ApiResult<ListPage>) -> &[serde_json::Value] {
        slot.as_ref().map(|page| page.rows.as_slice()).unwrap_or(&[])
    }
}

/// Marketplace page data.
#[derive(Debug, Clone)]
pub struct MarketBoard {
    pub wholesalers: ApiResult<ListPage>,
    pub market_prices: ApiResult<ListPage>,
    pub crops: ApiResult<ListPage>,
}

impl MarketBoard {
    pub fn failures(&self) -> Vec<(&'static str, &ApiFailure)> {
        collect_failures([
            ("wholesalers", &self.wholesalers),
            ("market prices", &self.market_prices),
            ("crops", &self.crops),
        ])
    }
}

fn collect_failures<'a, const N: usize>(
    slots: [(&'static str, &'a ApiResult<ListPage>); N],
) -> Vec<(&'static str, &'a ApiFailure)> {
    slots
        .into_iter()
        .filter_map(|(label, slot)| slot.as_ref().err().map(|failure| (label, failure)))
        .collect()
}
