//! Feed wire types: raw records as the collector writes them to the channel.

use crate::shared::serde_util::{lenient_string, lenient_timestamp};
use crate::shared::PostId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// One post record under the feed channel, keyed by its database key.
///
/// Every field is optional on the wire; the collector omits what it could
/// not scrape. A field of an unexpected type reads as absent instead of
/// rejecting the record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostWire {
    #[serde(default)]
    pub tweet_id: Option<PostId>,
    #[serde(default, deserialize_with = "lenient_string::deserialize")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient_string::deserialize")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp::deserialize")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_level")]
    pub importance_level: u8,
    #[serde(default, deserialize_with = "lenient_string::deserialize")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string::deserialize")]
    pub insight: Option<String>,
    #[serde(default, deserialize_with = "lenient_string::deserialize")]
    pub source_list: Option<String>,
}

/// Accepts `3`, `3.0`, `"3"` or `null`. Anything outside `0..=5` is `0`.
fn lenient_level<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let level = match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Int(n)) => n,
        Some(Raw::Float(f)) if f.fract() == 0.0 => f as i64,
        Some(Raw::Text(s)) => s.trim().parse::<i64>().unwrap_or(0),
        Some(Raw::Float(_)) | None => 0,
    };
    Ok(u8::try_from(level).ok().filter(|l| *l <= 5).unwrap_or(0))
}
