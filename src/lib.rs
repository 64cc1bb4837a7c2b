//! # Market Pulse SDK
//!
//! Data layer for a single-page market dashboard: a curated social-post feed
//! pushed from a realtime database, next to a live Bitcoin price chart.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core**: Shared types, domain models, wire types, state containers (always available)
//! 2. **HTTP API**: `MarketPulseHttp` with per-endpoint retry policies and request timeouts
//! 3. **Feed stream**: Server-sent-event client for the realtime-database channel
//! 4. **Controller**: `PriceSeriesController`, the tokio-driven rolling price series
//! 5. **High-Level Client**: `MarketPulseClient` with nested sub-clients
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use market_pulse::prelude::*;
//!
//! let client = MarketPulseClient::builder()
//!     .feed_database_url("https://<project>.firebaseio.com")
//!     .build()?;
//!
//! let mut chart = client.prices().controller();
//! chart.start().await;
//! chart.set_mode(Mode::LastDay).await;
//!
//! let mut feed = client.feed().stream();
//! feed.connect().await?;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes and formatting used across all domains.
pub mod shared;

/// Domain modules (vertical slices): types, wire types, conversions, state.
pub mod domain;

/// Unified SDK error types.
pub mod error;

/// Upstream URL and channel constants.
pub mod network;

// ── Layer 2: HTTP API ────────────────────────────────────────────────────────

/// HTTP client with retry policies.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 3: Feed stream ─────────────────────────────────────────────────────

/// Realtime-database stream: SSE decoding, local tree, events.
pub mod stream;

// ── Layer 4: Controller ──────────────────────────────────────────────────────

/// Price series controller: rolling buffer, mode and refresh task.
#[cfg(feature = "native")]
pub use domain::price::controller;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `MarketPulseClient`: the primary entry point.
#[cfg(feature = "http")]
pub mod client;

/// Re-exported so implementors of [`PriceSource`](domain::price::source::PriceSource)
/// need no direct dependency.
#[cfg(feature = "http")]
pub use async_trait::async_trait;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared types
    pub use crate::shared::fmt::num::{price_tick, usd};
    pub use crate::shared::{direction_color, Direction, Granularity, PostId, NEUTRAL_COLOR};

    // Domain types: price
    pub use crate::domain::price::{Mode, PricePoint, SeriesBuffer, SERIES_CAPACITY};

    // Domain types: feed
    pub use crate::domain::feed::{
        FeedState, ImportanceFilter, ImportanceLevel, PostRecord, DEFAULT_AVATAR_URL,
    };

    // Errors
    pub use crate::error::{HttpError, SdkError, StreamError};

    // Network
    pub use crate::network::{DEFAULT_COIN_ID, DEFAULT_FEED_CHANNEL, DEFAULT_PRICE_API_URL};

    // HTTP client + sub-clients
    #[cfg(feature = "http")]
    pub use crate::client::{FeedClient, MarketPulseClient, MarketPulseClientBuilder, PricesClient};
    #[cfg(feature = "http")]
    pub use crate::domain::price::source::{HttpPriceSource, PriceSource};
    #[cfg(feature = "http")]
    pub use crate::http::retry::{RetryConfig, RetryPolicy};

    // Controller
    #[cfg(feature = "native")]
    pub use crate::domain::price::controller::{
        ApplyOutcome, ControllerConfig, PriceSeriesController, SeriesSnapshot, DATASET_LABEL,
    };

    // Feed stream
    pub use crate::stream::{FeedEvent, ReadyState, StreamConfig};
    #[cfg(feature = "native")]
    pub use crate::stream::native::FeedStream;
}
