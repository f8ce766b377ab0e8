//! Serde codec for signal and escalation timestamps.
//!
//! Writes RFC 3339 UTC with a `Z` suffix. Reads either RFC 3339 (any offset,
//! normalised to UTC) or a naive `YYYY-MM-DDTHH:MM:SS[.ffffff]` string, which
//! older logs used for UTC wall-clock time.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{de, Deserialize, Deserializer, Serializer};

use crate::CoreError;

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse a stored timestamp string.
///
/// # Errors
///
/// Returns [`CoreError::InvalidTimestamp`] if `raw` is neither RFC 3339 nor a
/// naive ISO-8601 date-time.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CoreError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| CoreError::InvalidTimestamp(raw.to_string()))
}

/// Format a timestamp the way it is persisted.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Serializer half of `#[serde(with = "sigtrack_core::timestamp")]`.
///
/// # Errors
///
/// Propagates the serializer's error.
pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_timestamp(ts))
}

/// Deserializer half of `#[serde(with = "sigtrack_core::timestamp")]`.
///
/// # Errors
///
/// Fails if the value is not a string or cannot be parsed by
/// [`parse_timestamp`].
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(de::Error::custom)
}
