//! Canonical time handling. Every stored or compared timestamp is UTC.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde_json::Value;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Interpret a feed timestamp as a UTC instant.
///
/// Accepts RFC 3339 strings (any offset), naive ISO-8601 or space-separated
/// datetimes (read as UTC), and integer or fractional epoch seconds.
/// Anything else yields `None`.
#[must_use]
pub fn parse_event_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_event_time_str(s),
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                DateTime::from_timestamp(secs, 0)
            } else {
                let secs = n.as_f64()?;
                if !secs.is_finite() {
                    return None;
                }
                #[allow(clippy::cast_possible_truncation)]
                DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
            }
        }
        _ => None,
    }
}

fn parse_event_time_str(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// The default watermark for an empty destination: `now - days`.
#[must_use]
pub fn lookback_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    TimeDelta::try_days(days)
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Round a duration in seconds to two decimal places.
#[must_use]
pub fn round_secs(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}
