//! Custom serde helpers for upstream wire formats.

/// Lenient timestamp field: accepts RFC 3339 / ISO 8601 strings, a few
/// naive date-time layouts, or epoch milliseconds (integer or float).
///
/// The collector writes whatever the source page exposed, including `""`
/// when no timestamp was found. Anything unparseable becomes `None` rather
/// than failing the whole record.
pub mod lenient_timestamp {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::de::IgnoredAny;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        FloatMillis(f64),
        Text(String),
        Other(IgnoredAny),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Raw>::deserialize(deserializer)?;
        Ok(match raw {
            Some(Raw::Millis(ms)) => DateTime::<Utc>::from_timestamp_millis(ms),
            Some(Raw::FloatMillis(ms)) if ms.is_finite() => {
                DateTime::<Utc>::from_timestamp_millis(ms as i64)
            }
            Some(Raw::Text(s)) => parse(&s),
            Some(Raw::FloatMillis(_)) | Some(Raw::Other(_)) | None => None,
        })
    }

    /// Parse a timestamp string; naive forms are taken as UTC.
    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
            return Some(dt.with_timezone(&Utc));
        }
        for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, pattern) {
                return Some(naive.and_utc());
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

/// Lenient text field: strings pass through, numbers are rendered, and
/// `null`, booleans, arrays or objects become `None`.
pub mod lenient_string {
    use serde::de::IgnoredAny;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
        Other(IgnoredAny),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Text(s)) => Some(s),
            Some(Raw::Int(n)) => Some(n.to_string()),
            Some(Raw::Float(f)) => Some(f.to_string()),
            Some(Raw::Other(_)) | None => None,
        })
    }
}
