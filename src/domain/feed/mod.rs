//! Feed domain: curated social posts with an importance classification.

#[cfg(feature = "http")]
pub mod client;
pub mod convert;
pub mod state;
pub mod wire;

use crate::error::SdkError;
use crate::shared::fmt::time::post_timestamp;
use crate::shared::PostId;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

pub use state::FeedState;

/// Avatar shown when a post has no image.
pub const DEFAULT_AVATAR_URL: &str = "/default-profile.png";

// ─── ImportanceLevel ─────────────────────────────────────────────────────────

/// Importance classification of a post, `1..=5`.
///
/// `0` means classification failed upstream. Such posts are kept, never match
/// a numeric filter, and render with the level-1 badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportanceLevel(u8);

impl ImportanceLevel {
    pub const UNCLASSIFIED: Self = Self(0);
    pub const MAX: u8 = 5;

    /// Values above 5 are treated as unclassified.
    pub fn new(level: u8) -> Self {
        if level <= Self::MAX {
            Self(level)
        } else {
            Self::UNCLASSIFIED
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn is_classified(&self) -> bool {
        self.0 > 0
    }

    /// Badge colour name.
    pub fn badge_color(&self) -> &'static str {
        match self.0 {
            2 => "blue",
            3 => "yellow",
            4 => "orange",
            5 => "red",
            _ => "gray",
        }
    }
}

impl Display for ImportanceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── ImportanceFilter ────────────────────────────────────────────────────────

/// Importance selector: everything, or one exact level.
///
/// Build level filters with [`ImportanceFilter::level`], [`ImportanceFilter::options`]
/// or `parse`; a hand-built `Level` outside `1..=5` matches nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ImportanceFilter {
    #[default]
    All,
    Level(u8),
}

impl ImportanceFilter {
    /// Filter on one classified level, `1` to `5`.
    pub fn level(level: u8) -> Result<Self, SdkError> {
        if (1..=ImportanceLevel::MAX).contains(&level) {
            Ok(Self::Level(level))
        } else {
            Err(SdkError::Validation(format!(
                "importance filter must be All or 1-5, got {}",
                level
            )))
        }
    }

    /// Selector order: `All`, then `1` to `5`.
    pub fn options() -> impl Iterator<Item = ImportanceFilter> {
        std::iter::once(Self::All).chain((1..=ImportanceLevel::MAX).map(Self::Level))
    }

    pub fn matches(&self, level: ImportanceLevel) -> bool {
        match self {
            Self::All => true,
            Self::Level(wanted) => level.is_classified() && level.get() == *wanted,
        }
    }
}

impl Display for ImportanceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::Level(l) => write!(f, "{}", l),
        }
    }
}

impl FromStr for ImportanceFilter {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<u8>()
            .map_err(|_| {
                SdkError::Validation(format!("importance filter must be All or 1-5, got {:?}", s))
            })
            .and_then(Self::level)
    }
}

// ─── PostRecord ──────────────────────────────────────────────────────────────

/// A curated post as the feed renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: PostId,
    /// Key of the record under the channel.
    pub key: String,
    pub username: String,
    pub text: String,
    /// `None` when upstream wrote nothing parseable.
    pub timestamp: Option<DateTime<Utc>>,
    pub importance: ImportanceLevel,
    pub image_url: Option<String>,
    pub insight: Option<String>,
    /// The curated list the post was collected from.
    pub source_list: Option<String>,
}

impl PostRecord {
    pub fn avatar_url(&self) -> &str {
        self.image_url.as_deref().unwrap_or(DEFAULT_AVATAR_URL)
    }

    pub fn has_insight(&self) -> bool {
        self.insight.is_some()
    }

    pub fn badge_color(&self) -> &'static str {
        self.importance.badge_color()
    }

    /// `dd/mm/yyyy, HH:MM:SS` in `tz`, or an empty string without a timestamp.
    pub fn display_timestamp<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.timestamp
            .as_ref()
            .map(|at| post_timestamp(at, tz))
            .unwrap_or_default()
    }
}
