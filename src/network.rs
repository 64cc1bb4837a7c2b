//! Upstream URL and channel constants.

/// Default public market-data API base URL.
pub const DEFAULT_PRICE_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Coin tracked by the price chart.
pub const DEFAULT_COIN_ID: &str = "bitcoin";

/// Quote currency for all price requests.
pub const DEFAULT_VS_CURRENCY: &str = "usd";

/// Realtime-database channel holding the curated posts.
pub const DEFAULT_FEED_CHANNEL: &str = "twitter-list-tweets";
