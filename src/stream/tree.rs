//! Local mirror of the streamed channel value.

use super::sse::SseEvent;
use crate::error::StreamError;
use serde::Deserialize;
use serde_json::{Map, Value};

/// A realtime-database streaming event.
#[derive(Debug, Clone, PartialEq)]
pub enum RtdbEvent {
    /// Set the value at `path`; `null` deletes.
    Put { path: String, data: Value },
    /// Set each child of `data` under `path`.
    Patch { path: String, data: Value },
    KeepAlive,
    /// The server ended the stream, e.g. after a rules change.
    Cancel(String),
    AuthRevoked,
    Unknown(String),
}

#[derive(Deserialize)]
struct PathData {
    path: String,
    #[serde(default)]
    data: Value,
}

impl RtdbEvent {
    pub fn from_sse(event: &SseEvent) -> Result<Self, StreamError> {
        match event.event.as_str() {
            "put" | "patch" => {
                let body: PathData = serde_json::from_str(&event.data).map_err(|e| {
                    StreamError::Protocol(format!("invalid {} payload: {}", event.event, e))
                })?;
                Ok(if event.event == "put" {
                    Self::Put {
                        path: body.path,
                        data: body.data,
                    }
                } else {
                    Self::Patch {
                        path: body.path,
                        data: body.data,
                    }
                })
            }
            "keep-alive" => Ok(Self::KeepAlive),
            "cancel" => {
                let reason = serde_json::from_str::<Option<String>>(&event.data)
                    .ok()
                    .flatten()
                    .unwrap_or_else(|| "cancelled by server".to_string());
                Ok(Self::Cancel(reason))
            }
            "auth_revoked" => Ok(Self::AuthRevoked),
            other => Ok(Self::Unknown(other.to_string())),
        }
    }
}

/// The channel's current value, rebuilt from `put`/`patch` events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedTree {
    root: Value,
}

impl FeedTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &Value {
        &self.root
    }

    /// Apply a data event. Returns `false` for events that carry no data.
    pub fn apply(&mut self, event: RtdbEvent) -> bool {
        match event {
            RtdbEvent::Put { path, data } => {
                self.apply_put(&path, data);
                true
            }
            RtdbEvent::Patch { path, data } => {
                self.apply_patch(&path, data);
                true
            }
            _ => false,
        }
    }

    pub fn apply_put(&mut self, path: &str, data: Value) {
        let segments = segments(path);
        if data.is_null() {
            remove(&mut self.root, &segments);
        } else {
            write(&mut self.root, &segments, data);
        }
    }

    pub fn apply_patch(&mut self, path: &str, data: Value) {
        match data {
            Value::Object(children) => {
                let base = path.trim_end_matches('/');
                for (key, value) in children {
                    self.apply_put(&format!("{}/{}", base, key), value);
                }
            }
            other => self.apply_put(path, other),
        }
    }

    pub fn clear(&mut self) {
        self.root = Value::Null;
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn write(node: &mut Value, path: &[&str], data: Value) {
    let Some((head, rest)) = path.split_first() else {
        *node = data;
        return;
    };
    if !node.is_object() {
        *node = Value::Object(into_object(std::mem::take(node)));
    }
    let Value::Object(map) = node else {
        return;
    };
    let child = map.entry(head.to_string()).or_insert(Value::Null);
    write(child, rest, data);
}

/// Delete the node at `path`, pruning parents left empty.
fn remove(node: &mut Value, path: &[&str]) {
    let Some((head, rest)) = path.split_first() else {
        *node = Value::Null;
        return;
    };
    if node.is_array() {
        *node = Value::Object(into_object(std::mem::take(node)));
    }
    let Value::Object(map) = node else {
        return;
    };
    if rest.is_empty() {
        map.remove(*head);
    } else if let Some(child) = map.get_mut(*head) {
        remove(child, rest);
        if child.is_null() {
            map.remove(*head);
        }
    }
    if map.is_empty() {
        *node = Value::Null;
    }
}

/// Arrays become index-keyed objects; scalars are discarded.
fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Map::new(),
    }
}
