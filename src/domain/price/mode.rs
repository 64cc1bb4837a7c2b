//! Chart time-range modes and their static refresh configuration.

use crate::error::SdkError;
use crate::shared::Granularity;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// The chart's time-range selector. Exactly one mode is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// 30 days of history, then a live poll every 30 seconds.
    #[default]
    #[serde(rename = "1s")]
    NearRealtime,
    /// Roughly the last hour, fetched once.
    #[serde(rename = "1m")]
    LastHour,
    /// The last 24 hours, fetched once.
    #[serde(rename = "1h")]
    LastDay,
}

impl Mode {
    /// Selector order.
    pub const ALL: [Mode; 3] = [Mode::NearRealtime, Mode::LastHour, Mode::LastDay];

    /// Stable selector key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::NearRealtime => "1s",
            Self::LastHour => "1m",
            Self::LastDay => "1h",
        }
    }

    /// Selector option text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NearRealtime => "Last seconds",
            Self::LastHour => "Last minutes (1 hour)",
            Self::LastDay => "Last hours (24 hours)",
        }
    }

    /// Live polling cadence; `None` means fetch once with no recurring poll.
    pub fn cadence(&self) -> Option<Duration> {
        match self {
            Self::NearRealtime => Some(Duration::from_secs(30)),
            Self::LastHour | Self::LastDay => None,
        }
    }

    /// Size of the historical window requested upstream, in days.
    pub fn window_days(&self) -> f64 {
        match self {
            Self::NearRealtime => 30.0,
            Self::LastHour => 0.041,
            Self::LastDay => 1.0,
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            Self::NearRealtime | Self::LastHour => Granularity::Minute,
            Self::LastDay => Granularity::Hour,
        }
    }

    pub fn is_realtime(&self) -> bool {
        matches!(self, Self::NearRealtime)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Mode {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.key() == s)
            .ok_or_else(|| SdkError::Validation(format!("unknown chart mode: {:?}", s)))
    }
}
