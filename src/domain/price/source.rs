//! Where the controller gets its prices from.

use super::wire::MarketChartPoint;
use crate::error::SdkError;
use crate::http::MarketPulseHttp;
use async_trait::async_trait;
use std::sync::Arc;

/// Upstream price data for one instrument.
#[async_trait]
pub trait PriceSource: Send + Sync + 'static {
    /// Historical `(time, price)` pairs spanning the last `days` days,
    /// oldest first.
    async fn history(&self, days: f64) -> Result<Vec<MarketChartPoint>, SdkError>;

    /// The current price.
    async fn current(&self) -> Result<f64, SdkError>;
}

#[async_trait]
impl<T: PriceSource + ?Sized> PriceSource for Arc<T> {
    async fn history(&self, days: f64) -> Result<Vec<MarketChartPoint>, SdkError> {
        (**self).history(days).await
    }

    async fn current(&self) -> Result<f64, SdkError> {
        (**self).current().await
    }
}

/// `PriceSource` backed by the market-data REST API.
#[derive(Clone)]
pub struct HttpPriceSource {
    http: MarketPulseHttp,
    coin_id: String,
    vs_currency: String,
}

impl HttpPriceSource {
    pub fn new(http: MarketPulseHttp, coin_id: &str, vs_currency: &str) -> Self {
        Self {
            http,
            coin_id: coin_id.to_string(),
            vs_currency: vs_currency.to_string(),
        }
    }

    pub fn coin_id(&self) -> &str {
        &self.coin_id
    }

    pub fn vs_currency(&self) -> &str {
        &self.vs_currency
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn history(&self, days: f64) -> Result<Vec<MarketChartPoint>, SdkError> {
        let resp = self
            .http
            .get_market_chart(&self.coin_id, &self.vs_currency, days)
            .await?;
        Ok(resp.prices)
    }

    async fn current(&self) -> Result<f64, SdkError> {
        Ok(self
            .http
            .get_current_price(&self.coin_id, &self.vs_currency)
            .await?)
    }
}
