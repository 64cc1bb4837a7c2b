//! Feed sub-client: one-shot channel reads and stream construction.

use super::FeedState;
use crate::client::MarketPulseClient;
use crate::error::SdkError;
use crate::http::RetryPolicy;
use serde_json::Value;

/// Sub-client for the curated post feed.
pub struct Feed<'a> {
    pub(crate) client: &'a MarketPulseClient,
}

impl<'a> Feed<'a> {
    /// Current raw value of the feed channel (`null` when empty).
    pub async fn snapshot(&self) -> Result<Value, SdkError> {
        let config = &self.client.stream_config;
        if config.database_url.trim().is_empty() {
            return Err(SdkError::Validation(
                "feed database URL is not configured".into(),
            ));
        }
        Ok(self
            .client
            .http
            .get::<Value>(&config.endpoint(), RetryPolicy::Idempotent)
            .await?)
    }

    /// Fetch the channel once and apply it to `state`.
    /// Returns whether the published list changed.
    pub async fn load_into(&self, state: &mut FeedState) -> Result<bool, SdkError> {
        let snapshot = self.snapshot().await?;
        Ok(state.on_snapshot(Some(&snapshot)))
    }

    /// A disconnected push stream for the configured channel.
    #[cfg(feature = "native")]
    pub fn stream(&self) -> crate::stream::native::FeedStream {
        crate::stream::native::FeedStream::new(self.client.stream_config.clone())
    }
}
