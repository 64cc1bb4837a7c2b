//! Prices sub-client: one-shot history and spot queries plus controller wiring.

use super::convert::label_series;
use super::mode::Mode;
use super::source::HttpPriceSource;
use super::PricePoint;
use crate::client::MarketPulseClient;
use crate::error::SdkError;
use chrono::Local;

/// Sub-client for price operations on the configured coin.
pub struct Prices<'a> {
    pub(crate) client: &'a MarketPulseClient,
}

impl<'a> Prices<'a> {
    /// Labeled historical series for `mode`'s window, oldest first.
    pub async fn history(&self, mode: Mode) -> Result<Vec<PricePoint>, SdkError> {
        let resp = self
            .client
            .http
            .get_market_chart(
                &self.client.coin_id,
                &self.client.vs_currency,
                mode.window_days(),
            )
            .await?;
        Ok(label_series(resp.prices, mode.granularity(), &Local))
    }

    /// Current spot price.
    pub async fn current(&self) -> Result<f64, SdkError> {
        Ok(self
            .client
            .http
            .get_current_price(&self.client.coin_id, &self.client.vs_currency)
            .await?)
    }

    /// A [`PriceSource`](super::source::PriceSource) sharing this client's HTTP pool.
    pub fn source(&self) -> HttpPriceSource {
        HttpPriceSource::new(
            self.client.http.clone(),
            &self.client.coin_id,
            &self.client.vs_currency,
        )
    }

    /// A stopped controller in the default near-real-time mode.
    /// Call [`start`](super::controller::PriceSeriesController::start) to arm it.
    #[cfg(feature = "native")]
    pub fn controller(&self) -> super::controller::PriceSeriesController<HttpPriceSource> {
        super::controller::PriceSeriesController::new(self.source())
    }
}
