//! Low-level HTTP client: `MarketPulseHttp`.
//!
//! One method per upstream endpoint. Returns wire types (conversion to domain
//! types happens in the sub-clients and the price source). Every request is
//! bounded by a timeout and GETs go through the idempotent retry policy.

use crate::domain::price::wire::{MarketChartResponse, SimplePriceResponse};
use crate::error::HttpError;
use crate::http::retry::RetryPolicy;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Per-request timeout used unless the builder overrides it.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying an optional market-data API key.
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// Low-level HTTP client for the market-data REST API.
#[derive(Clone)]
pub struct MarketPulseHttp {
    base_url: String,
    client: Client,
    /// Only attached to requests under `base_url`.
    api_key: Option<HeaderValue>,
}

impl MarketPulseHttp {
    /// Client with the default timeout and no API key.
    pub fn new(base_url: &str) -> Result<Self, HttpError> {
        Self::with_options(base_url, DEFAULT_REQUEST_TIMEOUT, None)
    }

    pub fn with_options(
        base_url: &str,
        timeout: Duration,
        api_key: Option<&str>,
    ) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let api_key = api_key
            .map(HeaderValue::from_str)
            .transpose()
            .map_err(|e| HttpError::BadRequest(format!("invalid API key header: {}", e)))?;

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Prices ───────────────────────────────────────────────────────────

    /// Historical prices covering the last `days` days (fractions allowed).
    pub async fn get_market_chart(
        &self,
        coin_id: &str,
        vs_currency: &str,
        days: f64,
    ) -> Result<MarketChartResponse, HttpError> {
        let url = format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}",
            self.base_url,
            urlencoding::encode(coin_id),
            urlencoding::encode(vs_currency),
            days
        );
        self.get(&url, RetryPolicy::Idempotent).await
    }

    pub async fn get_simple_price(
        &self,
        coin_ids: &str,
        vs_currencies: &str,
    ) -> Result<SimplePriceResponse, HttpError> {
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            self.base_url,
            urlencoding::encode(coin_ids),
            urlencoding::encode(vs_currencies)
        );
        self.get(&url, RetryPolicy::Idempotent).await
    }

    /// Current price of one coin, failing when the response omits it.
    pub async fn get_current_price(
        &self,
        coin_id: &str,
        vs_currency: &str,
    ) -> Result<f64, HttpError> {
        self.get_simple_price(coin_id, vs_currency)
            .await?
            .price(coin_id, vs_currency)
            .ok_or_else(|| HttpError::MissingPrice {
                coin_id: coin_id.to_string(),
                vs_currency: vs_currency.to_string(),
            })
    }

    // ── Internal HTTP methods ────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        let Some(config) = retry.config() else {
            return self.do_get(url).await;
        };

        let mut last_error = None;

        for attempt in 0..=config.max_retries {
            match self.do_get::<T>(url).await {
                Ok(resp) => return Ok(resp),
                Err(e) if config.is_retryable(&e) && attempt < config.max_retries => {
                    let delay = config.delay_for(attempt, &e);
                    tracing::debug!(
                        attempt = attempt + 1,
                        max = config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying request to {}",
                        url
                    );
                    futures_timer::Delay::new(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(HttpError::MaxRetriesExceeded {
            attempts: config.max_retries + 1,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn do_get<T: DeserializeOwned>(&self, url: &str) -> Result<T, HttpError> {
        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            if url.starts_with(&self.base_url) {
                request = request.header(API_KEY_HEADER, key.clone());
            }
        }
        let resp = request.send().await.map_err(classify)?;
        let status = resp.status();

        if status.is_success() {
            return resp.json::<T>().await.map_err(classify);
        }

        let retry_after_ms = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after_ms);
        let status_code = status.as_u16();
        let body_text = resp.text().await.unwrap_or_default();

        match status_code {
            404 => Err(HttpError::NotFound(body_text)),
            429 => Err(HttpError::RateLimited { retry_after_ms }),
            400..=499 => Err(HttpError::BadRequest(body_text)),
            _ => Err(HttpError::ServerError {
                status: status_code,
                body: body_text,
            }),
        }
    }
}

/// Surface reqwest timeouts as `HttpError::Timeout`.
fn classify(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout
    } else {
        HttpError::Reqwest(e)
    }
}

/// `Retry-After` in delta-seconds form. HTTP-date form is ignored.
fn parse_retry_after_ms(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().map(|s| s.saturating_mul(1000))
}
