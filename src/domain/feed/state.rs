//! Feed state container: the published, newest-first post list.

use super::wire::PostWire;
use super::{ImportanceFilter, PostRecord};
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;

/// Newest-first list of posts rebuilt from each feed snapshot.
///
/// The app owns instances of this type and feeds it snapshots from
/// [`FeedStream`](crate::stream::native::FeedStream) or a one-shot fetch.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    posts: Vec<PostRecord>,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the list from a raw channel value (`key → record`).
    ///
    /// Absent, `null` or empty snapshots leave the published list untouched,
    /// as do snapshots in which no record deserializes. Returns whether the
    /// list was replaced.
    pub fn on_snapshot(&mut self, snapshot: Option<&Value>) -> bool {
        let records: Vec<PostRecord> = match snapshot {
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(key, value)| parse_record(key, value))
                .collect(),
            // Sequential numeric keys come back as an array with holes.
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter(|(_, value)| !value.is_null())
                .filter_map(|(i, value)| parse_record(&i.to_string(), value))
                .collect(),
            _ => return false,
        };
        self.on_records(records)
    }

    /// Replace the list with `records`, newest first. Empty input is ignored.
    pub fn on_records(&mut self, mut records: Vec<PostRecord>) -> bool {
        if records.is_empty() {
            return false;
        }
        sort_newest_first(&mut records);
        self.posts = records;
        true
    }

    pub fn posts(&self) -> &[PostRecord] {
        &self.posts
    }

    /// Posts matching `filter`, in published order.
    pub fn filter(&self, filter: ImportanceFilter) -> Vec<&PostRecord> {
        self.posts
            .iter()
            .filter(|p| filter.matches(p.importance))
            .collect()
    }

    pub fn latest(&self) -> Option<&PostRecord> {
        self.posts.first()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

fn parse_record(key: &str, value: &Value) -> Option<PostRecord> {
    match PostWire::deserialize(value) {
        Ok(wire) => Some(PostRecord::from_wire(key, wire)),
        Err(e) => {
            tracing::warn!(key, error = %e, "Skipping malformed feed record");
            None
        }
    }
}

/// Stable sort, descending by timestamp. Undated posts go last.
fn sort_newest_first(records: &mut [PostRecord]) {
    records.sort_by(|a, b| match (&a.timestamp, &b.timestamp) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, ts: &str, level: u8) -> Value {
        json!({
            "tweet_id": id,
            "username": format!("user_{}", id),
            "text": "gm",
            "timestamp": ts,
            "importance_level": level,
        })
    }

    fn ids(posts: &[&PostRecord]) -> Vec<String> {
        posts.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn test_snapshot_sorted_newest_first() {
        let snapshot = json!({
            "a": record("1", "2026-10-18T10:00:00Z", 1),
            "b": record("2", "2026-10-18T12:00:00Z", 3),
            "c": record("3", "2026-10-18T11:00:00Z", 3),
            "d": record("4", "2026-10-18T09:00:00Z", 5),
        });
        let mut state = FeedState::new();
        assert!(state.on_snapshot(Some(&snapshot)));
        let all: Vec<&PostRecord> = state.posts().iter().collect();
        assert_eq!(ids(&all), ["2", "3", "1", "4"]);
    }

    #[test]
    fn test_filter_level_three() {
        let snapshot = json!({
            "a": record("1", "2026-10-18T10:00:00Z", 1),
            "b": record("2", "2026-10-18T12:00:00Z", 3),
            "c": record("3", "2026-10-18T11:00:00Z", 3),
            "d": record("4", "2026-10-18T09:00:00Z", 5),
        });
        let mut state = FeedState::new();
        state.on_snapshot(Some(&snapshot));

        assert_eq!(ids(&state.filter(ImportanceFilter::Level(3))), ["2", "3"]);
        assert_eq!(state.filter(ImportanceFilter::All).len(), 4);
        assert!(state.filter(ImportanceFilter::Level(2)).is_empty());
    }

    #[test]
    fn test_empty_or_absent_snapshot_keeps_list() {
        let mut state = FeedState::new();
        state.on_snapshot(Some(&json!({ "a": record("1", "2026-10-18T10:00:00Z", 2) })));
        assert_eq!(state.len(), 1);

        assert!(!state.on_snapshot(None));
        assert!(!state.on_snapshot(Some(&Value::Null)));
        assert!(!state.on_snapshot(Some(&json!({}))));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_ties_keep_key_order() {
        let snapshot = json!({
            "a": record("first", "2026-10-18T10:00:00Z", 1),
            "b": record("second", "2026-10-18T10:00:00Z", 1),
        });
        let mut state = FeedState::new();
        state.on_snapshot(Some(&snapshot));
        let all: Vec<&PostRecord> = state.posts().iter().collect();
        assert_eq!(ids(&all), ["first", "second"]);
    }

    #[test]
    fn test_undated_posts_sort_last() {
        let snapshot = json!({
            "a": record("undated", "not a date", 1),
            "b": record("dated", "2020-01-01T00:00:00Z", 1),
        });
        let mut state = FeedState::new();
        state.on_snapshot(Some(&snapshot));
        assert_eq!(state.latest().unwrap().id.as_str(), "dated");
        assert_eq!(state.posts()[1].id.as_str(), "undated");
    }

    #[test]
    fn test_malformed_records_skipped() {
        let snapshot = json!({
            "a": record("1", "2026-10-18T10:00:00Z", 1),
            "b": "not an object",
            "c": true,
        });
        let mut state = FeedState::new();
        assert!(state.on_snapshot(Some(&snapshot)));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_odd_field_types_still_render() {
        let snapshot = json!({
            "a": record("1", "2026-10-18T10:00:00Z", 1),
            "b": { "tweet_id": "2", "username": null, "text": null, "timestamp": 1792332202000.0_f64 },
            "c": { "tweet_id": "3", "text": "gm", "timestamp": true, "importance_level": 4 },
        });
        let mut state = FeedState::new();
        assert!(state.on_snapshot(Some(&snapshot)));
        assert_eq!(state.len(), 3);

        let ids: Vec<&str> = state.posts().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["2", "1", "3"]);
        assert!(state.posts()[0].username.is_empty());
        assert!(state.posts()[0].text.is_empty());
        assert!(state.posts()[2].timestamp.is_none());
    }

    #[test]
    fn test_only_malformed_records_is_no_change() {
        let mut state = FeedState::new();
        state.on_snapshot(Some(&json!({ "a": record("1", "2026-10-18T10:00:00Z", 1) })));
        assert!(!state.on_snapshot(Some(&json!({ "x": 17 }))));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_array_snapshot_uses_indices_as_keys() {
        let snapshot = json!([null, { "username": "a", "timestamp": "2026-10-18T10:00:00Z" }]);
        let mut state = FeedState::new();
        assert!(state.on_snapshot(Some(&snapshot)));
        assert_eq!(state.posts()[0].id.as_str(), "1");
    }
}
