//! HTTP client layer: `MarketPulseHttp` with per-endpoint retry policies.

pub mod client;
pub mod retry;

pub use client::{MarketPulseHttp, DEFAULT_REQUEST_TIMEOUT};
pub use retry::{RetryConfig, RetryPolicy};
