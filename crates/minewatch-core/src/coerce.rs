//! Lenient coercion of untrusted payload values.
//!
//! Backend payloads mix numbers, numeric strings, epoch seconds, epoch
//! milliseconds and date strings for the same field. Every helper here
//! returns `None` for anything it cannot read instead of failing, and never
//! yields a non-finite number.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Epoch values above this are milliseconds, below are seconds.
pub const EPOCH_MILLIS_THRESHOLD: f64 = 1e12;

/// Largest representable offset from the epoch for a calendar timestamp.
const MAX_EPOCH_MILLIS: f64 = 8.64e15;

/// Read a finite number from a JSON number or from the leading numeric part
/// of a string (`"12.5 ha"` reads as `12.5`).
pub fn parse_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => numeric_prefix(s),
        _ => None,
    }
}

/// Whole-value numeric conversion: the entire (trimmed) string must be a
/// number, empty strings and `null` read as zero, booleans as 0/1.
pub fn to_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().ok()?
            }
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null => 0.0,
        _ => return None,
    };
    Some(number).filter(|v| v.is_finite())
}

fn numeric_prefix(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }

    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        let mut frac_digits = 0;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
            frac_digits += 1;
        }
        if digits + frac_digits > 0 {
            end = frac_end;
            digits += frac_digits;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    let candidate = s[..end].trim_end_matches('.');
    candidate.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Interpret an epoch number, in seconds or milliseconds by magnitude.
pub fn timestamp_from_epoch(epoch: f64) -> Option<DateTime<Utc>> {
    if !epoch.is_finite() {
        return None;
    }
    let millis = if epoch > EPOCH_MILLIS_THRESHOLD {
        epoch
    } else {
        epoch * 1000.0
    };
    if millis.abs() > MAX_EPOCH_MILLIS {
        return None;
    }
    DateTime::from_timestamp_millis(millis.trunc() as i64)
}

/// Read a timestamp from an epoch number, a numeric string or a date string.
pub fn coerce_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => timestamp_from_epoch(n.as_f64()?),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Some(epoch) = trimmed.parse::<f64>().ok().filter(|v| v.is_finite()) {
                if let Some(ts) = timestamp_from_epoch(epoch) {
                    return Some(ts);
                }
            }
            parse_date_text(trimmed)
        }
        _ => None,
    }
}

fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offset-less date-times are read as UTC.
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Canonical text form of a timestamp: RFC 3339, millisecond precision, `Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Read a non-negative duration, scaled down by `divisor` (1000 for millisecond fields).
pub fn coerce_duration_seconds(value: &Value, divisor: f64) -> Option<f64> {
    if divisor == 0.0 {
        return None;
    }
    let scaled = parse_numeric(value)? / divisor;
    (scaled.is_finite() && scaled >= 0.0).then_some(scaled)
}

pub fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Confidence as a 0-100 percentage. Values above 1 are already
/// percentages, anything else is a fraction.
pub fn normalize_confidence(value: &Value) -> Option<f64> {
    confidence_to_percent(parse_numeric(value)?)
}

pub fn confidence_to_percent(numeric: f64) -> Option<f64> {
    if numeric.is_nan() {
        return None;
    }
    let percent = if numeric > 1.0 { numeric } else { numeric * 100.0 };
    percent.is_finite().then(|| clamp_percent(percent))
}

/// Look up a dotted path (`"timing.startTime"`) through nested objects.
pub fn value_at_path<'a>(source: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(source, |acc, key| acc.as_object()?.get(key))
}

/// First key of `source` holding a non-null value.
pub fn pick<'a>(source: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| source.get(*key))
        .find(|value| !value.is_null())
}

/// The `properties` of a GeoJSON-like feature, or the record itself when flat.
pub fn properties_of(record: &Value) -> &Value {
    match record.get("properties") {
        Some(props) if !props.is_null() => props,
        _ => record,
    }
}

/// Flag semantics of loosely-typed payloads: `0`, `""`, `false` and `null` are unset.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0 && !v.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text form of an identifier value (`7` -> `"7"`, `7.5` -> `"7.5"`).
pub fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                let f = n.as_f64().unwrap_or(0.0);
                if f.fract() == 0.0 && f.abs() < 1e21 {
                    format!("{:.0}", f)
                } else {
                    f.to_string()
                }
            }
        }
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| if item.is_null() { String::new() } else { id_string(item) })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Non-negative whole count from a lenient numeric value.
pub fn coerce_count(value: &Value) -> Option<u64> {
    parse_numeric(value).map(round_count)
}

pub fn round_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}
