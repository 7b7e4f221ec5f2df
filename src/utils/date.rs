//! Date normalization.
//!
//! WordPress reports dates in a handful of shapes. Everything leaves the
//! resolver as RFC 3339 in UTC (`2024-03-15T10:00:00Z`), or `null` when the
//! input cannot be read.
//!
//! | Input | Reading |
//! |-------|---------|
//! | `2024-03-15T10:00:00+02:00` | RFC 3339, converted to UTC |
//! | `2024-03-15T10:00:00` | naive, assumed UTC |
//! | `2024-03-15 10:00:00` | naive, assumed UTC |
//! | `2024-03-15` | midnight UTC |

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse any supported date shape into UTC.
pub fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[inline]
pub fn to_rfc3339(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Normalized JSON value for a date string.
pub fn normalize(s: &str) -> Value {
    parse_utc(s).map_or(Value::Null, |date| Value::String(to_rfc3339(&date)))
}
