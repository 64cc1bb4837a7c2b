//! Shared newtypes and utilities used across all domain modules.
//!
//! These types are serialization-transparent: they serialize/deserialize identically
//! to the raw format upstream sends, so they can be used directly in wire types
//! without conversion overhead.

pub mod fmt;
pub mod serde_util;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

// ─── PostId ──────────────────────────────────────────────────────────────────

/// Newtype for post identifiers (the source platform's status id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PostId(String);

impl PostId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PostId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PostId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl FromStr for PostId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PostId(s.to_string()))
    }
}

impl Serialize for PostId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Some collectors wrote numeric ids; accept both.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => PostId(s),
            Raw::Number(n) => PostId(n.to_string()),
        })
    }
}

// ─── Granularity ─────────────────────────────────────────────────────────────

/// How finely chart labels are formatted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Minute,
    Hour,
    Date,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Date => "date",
        }
    }

    /// `chrono` format pattern for labels at this granularity.
    pub fn label_pattern(&self) -> &'static str {
        match self {
            Self::Minute => "%H:%M:%S",
            Self::Hour => "%d/%m, %H:%M",
            Self::Date => "%d/%m/%Y",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─── Direction ───────────────────────────────────────────────────────────────

/// Colour of the chart line before any price comparison has been made.
pub const NEUTRAL_COLOR: &str = "#f7931a";

/// Whether the latest price rose or fell against the previous observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Compare a new price to the previous one. Unchanged prices count as `Down`.
    pub fn between(previous: f64, latest: f64) -> Self {
        if latest > previous {
            Self::Up
        } else {
            Self::Down
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Up => "#00ff88",
            Self::Down => "#ff4d4d",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Line colour for an optional direction (neutral until the first comparison).
pub fn direction_color(direction: Option<Direction>) -> &'static str {
    direction.map(|d| d.color()).unwrap_or(NEUTRAL_COLOR)
}
