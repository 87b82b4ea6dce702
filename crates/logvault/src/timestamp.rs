//! Lenient calendar date-time parsing.
//!
//! Entries keep the timestamp text exactly as submitted; every comparison
//! goes through [`parse_instant`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Offset-less layouts, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a calendar date-time into a UTC instant.
///
/// Accepts RFC 3339, RFC 2822, ISO date-times without an offset (taken as
/// UTC) and bare `YYYY-MM-DD` dates (midnight UTC). Returns `None` for
/// anything else, including empty input.
#[must_use]
pub fn parse_instant(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
