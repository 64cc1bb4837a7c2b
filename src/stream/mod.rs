//! Feed stream layer: realtime-database events over server-sent events.
//!
//! The database streams a channel as `GET {database_url}/{channel}.json` with
//! `Accept: text/event-stream`. This module holds the transport-independent
//! pieces (SSE decoding, the local JSON tree, events and config); the tokio
//! client lives in `native.rs`.

pub mod sse;
pub mod tree;

#[cfg(feature = "native")]
pub mod native;

use serde_json::Value;

pub use sse::{SseDecoder, SseEvent};
pub use tree::{FeedTree, RtdbEvent};

// ─── FeedEvent ───────────────────────────────────────────────────────────────

/// Events emitted by the feed stream to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Stream established; a full snapshot follows.
    Connected,
    /// Full current value of the channel after a server update.
    Snapshot(Value),
    /// Stream lost (may trigger reconnect).
    Disconnected { reason: String },
    /// A protocol or connection error.
    Error(String),
    /// Reconnection gave up.
    MaxReconnectReached,
}

// ─── ReadyState ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl From<u16> for ReadyState {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

// ─── StreamConfig ────────────────────────────────────────────────────────────

/// Configuration for the feed stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Realtime-database root, e.g. `https://<project>.firebaseio.com`.
    pub database_url: String,
    pub channel: String,
    /// Sent as the `auth` query parameter.
    pub auth_token: Option<String>,
    pub reconnect: bool,
    pub max_reconnect_attempts: u32,
    pub base_reconnect_delay_ms: u32,
    /// Bound on establishing the stream (connect plus response headers).
    pub connect_timeout_ms: u64,
    /// The server sends a keep-alive every 30s; silence past this drops the connection.
    pub idle_timeout_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            channel: crate::network::DEFAULT_FEED_CHANNEL.to_string(),
            auth_token: None,
            reconnect: true,
            max_reconnect_attempts: 10,
            base_reconnect_delay_ms: 1000,
            connect_timeout_ms: 10_000,
            idle_timeout_ms: 90_000,
        }
    }
}

impl StreamConfig {
    pub fn new(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            ..Self::default()
        }
    }

    /// Streaming URL of the channel.
    pub fn endpoint(&self) -> String {
        let mut url = format!(
            "{}/{}.json",
            self.database_url.trim_end_matches('/'),
            self.channel.trim_matches('/')
        );
        if let Some(token) = &self.auth_token {
            url.push_str("?auth=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let config = StreamConfig::new("https://demo.firebaseio.com/");
        assert_eq!(
            config.endpoint(),
            "https://demo.firebaseio.com/twitter-list-tweets.json"
        );
    }

    #[test]
    fn test_endpoint_with_auth() {
        let config = StreamConfig {
            auth_token: Some("a b".to_string()),
            channel: "/posts/".to_string(),
            ..StreamConfig::new("https://demo.firebaseio.com")
        };
        assert_eq!(
            config.endpoint(),
            "https://demo.firebaseio.com/posts.json?auth=a%20b"
        );
    }

    #[test]
    fn test_ready_state_from_u16() {
        assert_eq!(ReadyState::from(1), ReadyState::Open);
        assert_eq!(ReadyState::from(42), ReadyState::Closed);
        assert_eq!(ReadyState::from(ReadyState::Closing as u16), ReadyState::Closing);
    }
}
