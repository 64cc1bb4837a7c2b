//! Wire types for the market-data REST endpoints.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One `[epochMillis, price]` pair from a market-chart response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct MarketChartPoint {
    pub time_ms: i64,
    pub price: f64,
}

impl From<(f64, f64)> for MarketChartPoint {
    fn from((time, price): (f64, f64)) -> Self {
        Self {
            time_ms: time as i64,
            price,
        }
    }
}

impl From<MarketChartPoint> for (f64, f64) {
    fn from(p: MarketChartPoint) -> Self {
        (p.time_ms as f64, p.price)
    }
}

/// `GET /coins/{id}/market_chart` response. Only `prices` is consumed.
///
/// `prices` is required: error bodies served with a success status (rate
/// limits, unknown coin) must fail to decode instead of yielding an empty
/// series.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketChartResponse {
    pub prices: Vec<MarketChartPoint>,
}

/// `GET /simple/price` response: coin id → quote currency → price.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct SimplePriceResponse(pub HashMap<String, HashMap<String, f64>>);

impl SimplePriceResponse {
    pub fn price(&self, coin_id: &str, vs_currency: &str) -> Option<f64> {
        self.0.get(coin_id)?.get(vs_currency).copied()
    }
}
