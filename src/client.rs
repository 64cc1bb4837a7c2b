//! High-level client: `MarketPulseClient` with nested sub-client accessors.
//!
//! Each domain has its own sub-client in `domain/<name>/client.rs`.
//! This module keeps the builder, shared configuration, and accessor methods.

use crate::domain::feed::client::Feed;
use crate::domain::price::client::Prices;
use crate::error::SdkError;
use crate::http::{MarketPulseHttp, DEFAULT_REQUEST_TIMEOUT};
use crate::stream::StreamConfig;

use std::time::Duration;

// Re-export sub-client types for convenience.
pub use crate::domain::feed::client::Feed as FeedClient;
pub use crate::domain::price::client::Prices as PricesClient;

/// The primary entry point for the Market Pulse SDK.
///
/// Provides nested sub-client accessors for each domain:
/// `client.prices()`, `client.feed()`.
#[derive(Clone)]
pub struct MarketPulseClient {
    pub(crate) http: MarketPulseHttp,
    pub(crate) coin_id: String,
    pub(crate) vs_currency: String,
    pub(crate) stream_config: StreamConfig,
}

impl MarketPulseClient {
    pub fn builder() -> MarketPulseClientBuilder {
        MarketPulseClientBuilder::default()
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn prices(&self) -> Prices<'_> {
        Prices { client: self }
    }

    pub fn feed(&self) -> Feed<'_> {
        Feed { client: self }
    }

    /// Stream config for creating a feed connection.
    ///
    /// The stream is not embedded in `MarketPulseClient` because its lifetime
    /// is typically tied to the view that renders the feed.
    pub fn stream_config(&self) -> &StreamConfig {
        &self.stream_config
    }

    pub fn coin_id(&self) -> &str {
        &self.coin_id
    }

    pub fn vs_currency(&self) -> &str {
        &self.vs_currency
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct MarketPulseClientBuilder {
    price_api_url: String,
    api_key: Option<String>,
    request_timeout: Duration,
    coin_id: String,
    vs_currency: String,
    stream_config: StreamConfig,
}

impl Default for MarketPulseClientBuilder {
    fn default() -> Self {
        Self {
            price_api_url: crate::network::DEFAULT_PRICE_API_URL.to_string(),
            api_key: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            coin_id: crate::network::DEFAULT_COIN_ID.to_string(),
            vs_currency: crate::network::DEFAULT_VS_CURRENCY.to_string(),
            stream_config: StreamConfig::default(),
        }
    }
}

impl MarketPulseClientBuilder {
    pub fn price_api_url(mut self, url: &str) -> Self {
        self.price_api_url = url.to_string();
        self
    }

    /// Market-data API key, sent on every price request.
    pub fn api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn coin_id(mut self, coin_id: &str) -> Self {
        self.coin_id = coin_id.to_string();
        self
    }

    pub fn vs_currency(mut self, vs_currency: &str) -> Self {
        self.vs_currency = vs_currency.to_string();
        self
    }

    pub fn feed_database_url(mut self, url: &str) -> Self {
        self.stream_config.database_url = url.to_string();
        self
    }

    pub fn feed_channel(mut self, channel: &str) -> Self {
        self.stream_config.channel = channel.to_string();
        self
    }

    pub fn feed_auth_token(mut self, token: &str) -> Self {
        self.stream_config.auth_token = Some(token.to_string());
        self
    }

    /// Replace the whole stream config (reconnect policy, timeouts).
    pub fn stream_config(mut self, config: StreamConfig) -> Self {
        self.stream_config = config;
        self
    }

    pub fn build(self) -> Result<MarketPulseClient, SdkError> {
        if self.coin_id.trim().is_empty() || self.vs_currency.trim().is_empty() {
            return Err(SdkError::Validation(
                "coin id and quote currency must not be empty".into(),
            ));
        }

        Ok(MarketPulseClient {
            http: MarketPulseHttp::with_options(
                &self.price_api_url,
                self.request_timeout,
                self.api_key.as_deref(),
            )?,
            coin_id: self.coin_id,
            vs_currency: self.vs_currency,
            stream_config: self.stream_config,
        })
    }
}
