//! Timestamp formatting for chart labels and post cards.

use crate::shared::Granularity;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;

/// Format an epoch-millis timestamp as a chart label in `tz`.
///
/// - `Minute` → `14:03:22`
/// - `Hour` → `18/10, 14:03`
/// - `Date` → `18/10/2026`
///
/// Out-of-range timestamps yield an empty label.
pub fn chart_label<Tz>(time_ms: i64, granularity: Granularity, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match DateTime::<Utc>::from_timestamp_millis(time_ms) {
        Some(utc) => utc
            .with_timezone(tz)
            .format(granularity.label_pattern())
            .to_string(),
        None => String::new(),
    }
}

/// Full post timestamp, e.g. `18/10/2026, 14:03:22`.
pub fn post_timestamp<Tz>(at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.with_timezone(tz).format("%d/%m/%Y, %H:%M:%S").to_string()
}
