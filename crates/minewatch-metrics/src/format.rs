//! Display strings for areas, percentages, durations and coordinates

use minewatch_core::coerce::confidence_to_percent;
use minewatch_core::M2_PER_HECTARE;

/// Largest fraction digit count accepted by the decimal formatters
pub const MAX_FRACTION_DIGITS: usize = 100;

const MISSING: &str = "--";
const NO_COORDINATE: &str = "—";

/// Group the integer digits of an already fixed-point string with commas.
fn group_thousands(fixed: &str) -> String {
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Fixed-point rendering of `v` rounded half away from zero.
///
/// Rounds the shortest decimal form of `v` (what `Display` prints), so
/// `1.005` becomes `1.01` even though the nearest binary value lies below
/// the tie.
fn fixed_half_away(v: f64, digits: usize) -> String {
    let shortest = v.abs().to_string();
    let (integer, fraction) = shortest.split_once('.').unwrap_or((shortest.as_str(), ""));

    let mut kept: Vec<u8> = integer.bytes().collect();
    let frac = fraction.as_bytes();
    kept.extend((0..digits).map(|i| frac.get(i).copied().unwrap_or(b'0')));

    if frac.get(digits).is_some_and(|d| *d >= b'5') {
        let mut carry = true;
        for d in kept.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            kept.insert(0, b'1');
        }
    }

    let split = kept.len() - digits;
    let mut out = String::with_capacity(kept.len() + 2);
    if v.is_sign_negative() {
        out.push('-');
    }
    out.extend(kept[..split].iter().map(|d| *d as char));
    if digits > 0 {
        out.push('.');
        out.extend(kept[split..].iter().map(|d| *d as char));
    }
    out
}

/// Requested fraction digits, or `None` when above [`MAX_FRACTION_DIGITS`].
pub fn checked_fraction_digits(requested: u32) -> Option<usize> {
    usize::try_from(requested).ok().filter(|d| *d <= MAX_FRACTION_DIGITS)
}

/// `1234.5` with 2 digits -> `"1,234.50"`; `--` when absent.
///
/// `digits` is capped at [`MAX_FRACTION_DIGITS`].
pub fn format_decimal(value: Option<f64>, digits: usize) -> String {
    let digits = digits.min(MAX_FRACTION_DIGITS);
    match value {
        None => MISSING.to_string(),
        Some(v) if v.is_nan() => MISSING.to_string(),
        Some(v) if v.is_infinite() => {
            if v > 0.0 { "∞".to_string() } else { "-∞".to_string() }
        }
        Some(v) => group_thousands(&fixed_half_away(v, digits)),
    }
}

/// Square metres rendered as hectares.
pub fn format_hectares(area_m2: Option<f64>, digits: usize) -> String {
    format_decimal(area_m2.map(|m2| m2 / M2_PER_HECTARE), digits)
}

pub fn format_percent(value: Option<f64>, digits: usize) -> String {
    format_decimal(value, digits)
}

/// Confidence (fraction or percent) as `"82.0%"`.
pub fn to_percent_string(value: Option<f64>, digits: usize) -> String {
    match value.and_then(confidence_to_percent) {
        Some(percent) => format!("{}%", format_decimal(Some(percent), digits)),
        None => MISSING.to_string(),
    }
}

/// `3723` -> `"1h 2m 3s"`, zero parts omitted.
pub fn format_duration(seconds: Option<f64>) -> String {
    let total = match seconds {
        Some(s) if s.is_finite() && s >= 0.0 => s,
        _ => return "N/A".to_string(),
    };
    if total == 0.0 {
        return "0s".to_string();
    }

    let hours = (total / 3600.0).floor() as u64;
    let minutes = ((total % 3600.0) / 60.0).floor() as u64;
    let secs = (total % 60.0).floor() as u64;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{}s", secs));
    }
    parts.join(" ")
}

/// Average run time in minutes, `"4.09 min"`.
pub fn format_average_duration(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s.is_finite() => {
            if s <= 0.0 {
                "0.00 min".to_string()
            } else {
                format!("{} min", format_decimal(Some(s / 60.0), 2))
            }
        }
        _ => MISSING.to_string(),
    }
}

/// Elapsed wall time as `M:SS`; minutes are not wrapped into hours.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub fn format_coordinate(value: Option<f64>, digits: usize) -> String {
    match value {
        Some(v) if !v.is_nan() => format!("{:.*}", digits, v),
        _ => NO_COORDINATE.to_string(),
    }
}

/// `[min_lon, min_lat, max_lon, max_lat]` as `"SW lat, lon → NE lat, lon"`.
pub fn format_bounds(bounds: Option<[f64; 4]>) -> String {
    let Some([min_lon, min_lat, max_lon, max_lat]) = bounds else {
        return NO_COORDINATE.to_string();
    };
    format!(
        "SW {}, {} → NE {}, {}",
        format_coordinate(Some(min_lat), 4),
        format_coordinate(Some(min_lon), 4),
        format_coordinate(Some(max_lat), 4),
        format_coordinate(Some(max_lon), 4),
    )
}
