use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use eyre::Result;
use serde::Serialize;

/// Seconds a planned swap stays valid.
pub const ROUTE_DEADLINE_SECONDS: u64 = 1_800;
pub const DEFAULT_SLIPPAGE_PERCENT: f64 = 0.5;
pub const MAX_SWAPS_PER_PATH: u8 = 4;

/// Exact-input route request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub chain_id: u64,
    pub from_token: Address,
    pub to_token: Address,
    pub amount_in: U256,
    pub recipient: Address,
    pub deadline: u64,
    pub slippage_bps: u32,
    pub max_swaps_per_path: u8,
    pub top_n: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// SwapRouter02 call data for the whole route.
    pub call_data: Bytes,
}

/// Finds swap routes. Returns `None` when no route exists.
#[async_trait]
pub trait RoutePlanner: Send + Sync {
    async fn route(&self, request: &RouteRequest) -> Result<Option<Route>>;
}

/// Answers every request with the same pre-computed router call data.
#[derive(Debug, Clone, Default)]
pub struct StaticRoutePlanner {
    call_data: Option<Bytes>,
}

impl StaticRoutePlanner {
    pub fn new(call_data: Option<Bytes>) -> Self {
        Self { call_data }
    }
}

#[async_trait]
impl RoutePlanner for StaticRoutePlanner {
    async fn route(&self, _request: &RouteRequest) -> Result<Option<Route>> {
        Ok(self.call_data.clone().map(|call_data| Route { call_data }))
    }
}
