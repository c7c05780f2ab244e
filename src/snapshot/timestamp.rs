//! Timestamp normalization
//!
//! Snapshot form: RFC 3339, UTC, with as many fractional digits as the
//! value needs (`2024-01-02T03:04:05Z`, `2024-01-02T03:04:05.123456Z`).
//! Storage form: SQLite text with the same fraction
//! (`2024-01-02 03:04:05`, `2024-01-02 03:04:05.123456`).
//! Naive inputs are read as UTC, which is what SQLite's date functions use.
//!
//! A stored value is only normalized when converting it back gives the
//! same text; anything else is exported verbatim.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// `%.f` prints 0, 3, 6 or 9 digits, the same choice as `SecondsFormat::AutoSi`
const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Parse any supported textual timestamp
pub fn parse(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn snapshot_form(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Snapshot text for any parseable timestamp, or `None`
pub fn to_snapshot_text(stored: &str) -> Option<String> {
    parse(stored).map(|dt| snapshot_form(&dt))
}

/// Storage text for any parseable timestamp, or `None`
pub fn to_storage_text(snapshot: &str) -> Option<String> {
    parse(snapshot).map(|dt| dt.format(STORAGE_FORMAT).to_string())
}

/// Snapshot text for `stored`, only if restoring it gives back `stored`
pub fn normalize(stored: &str) -> Option<String> {
    let snapshot = to_snapshot_text(stored)?;
    (to_storage_text(&snapshot)?.as_str() == stored).then_some(snapshot)
}

/// True if `text` is exactly what `normalize` produces for some instant
pub fn is_snapshot_text(text: &str) -> bool {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| snapshot_form(&dt.with_timezone(&Utc)) == text)
        .unwrap_or(false)
}
