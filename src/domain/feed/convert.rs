//! Conversions from wire records to `PostRecord`.

use super::wire::PostWire;
use super::{ImportanceLevel, PostRecord};
use crate::shared::PostId;

/// Insight text the classifier writes when it has nothing to say.
pub const NO_INSIGHT_SENTINEL: &str = "Nenhum";

impl PostRecord {
    /// Build a record from its wire form and database key.
    /// The id falls back to the key when the record carries none.
    pub fn from_wire(key: &str, wire: PostWire) -> Self {
        Self {
            id: wire.tweet_id.unwrap_or_else(|| PostId::from(key)),
            key: key.to_string(),
            username: wire.username.unwrap_or_default(),
            text: wire.text.unwrap_or_default(),
            timestamp: wire.timestamp,
            importance: ImportanceLevel::new(wire.importance_level),
            image_url: non_empty(wire.image_url),
            insight: non_empty(wire.insight).filter(|s| s != NO_INSIGHT_SENTINEL),
            source_list: non_empty(wire.source_list),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_falls_back_to_key() {
        let post = PostRecord::from_wire("-NxKey", PostWire::default());
        assert_eq!(post.id.as_str(), "-NxKey");
        assert_eq!(post.key, "-NxKey");
    }

    #[test]
    fn test_sentinel_and_blank_insight_dropped() {
        let mut wire = PostWire {
            insight: Some("Nenhum".to_string()),
            ..PostWire::default()
        };
        assert!(PostRecord::from_wire("a", wire.clone()).insight.is_none());

        wire.insight = Some("   ".to_string());
        assert!(PostRecord::from_wire("a", wire.clone()).insight.is_none());

        wire.insight = Some("Whale accumulation".to_string());
        assert_eq!(
            PostRecord::from_wire("a", wire).insight.as_deref(),
            Some("Whale accumulation")
        );
    }

    #[test]
    fn test_blank_image_uses_default_avatar() {
        let wire = PostWire {
            image_url: Some(String::new()),
            ..PostWire::default()
        };
        let post = PostRecord::from_wire("a", wire);
        assert!(post.image_url.is_none());
        assert_eq!(post.avatar_url(), super::super::DEFAULT_AVATAR_URL);
    }
}
