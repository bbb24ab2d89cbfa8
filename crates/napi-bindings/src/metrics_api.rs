//! NAPI bindings for metrics derivation and display formatting

use minewatch_metrics as metrics;
use napi::bindgen_prelude::*;
use serde_json::Value;

use crate::{parse_json, to_json};

/// Tile and mining area totals; accepts a tile list or an object with `tiles`
#[napi]
pub fn derive_tile_area_metrics(tiles_json: String) -> Result<String> {
    let value = parse_json(&tiles_json)?;
    let tiles = match &value {
        Value::Array(tiles) => tiles.as_slice(),
        other => other
            .get("tiles")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
    };
    to_json(&metrics::derive_tile_area_metrics(tiles))
}

#[napi]
pub fn derive_confidence_metrics(results_json: String) -> Result<String> {
    let results = parse_json(&results_json)?;
    to_json(&metrics::derive_confidence_metrics(&results))
}

#[napi]
pub fn extract_summary(raw_json: String) -> Result<String> {
    let raw = parse_json(&raw_json)?;
    to_json(&metrics::extract_summary(&raw))
}

#[napi]
pub fn build_mine_block_rows(raw_json: String) -> Result<String> {
    let raw = parse_json(&raw_json)?;
    to_json(&metrics::build_mine_block_rows(&raw))
}

/// Fraction digits from JS; defaults to 2, rejects anything above 100
fn digits_arg(requested: Option<u32>) -> Result<usize> {
    let requested = requested.unwrap_or(2);
    metrics::checked_fraction_digits(requested).ok_or_else(|| {
        Error::from_reason(format!(
            "fractionDigits must be between 0 and {}, got {}",
            metrics::MAX_FRACTION_DIGITS,
            requested
        ))
    })
}

#[napi]
pub fn format_hectares(area_m2: Option<f64>, fraction_digits: Option<u32>) -> Result<String> {
    Ok(metrics::format_hectares(area_m2, digits_arg(fraction_digits)?))
}

#[napi]
pub fn format_percent(value: Option<f64>, fraction_digits: Option<u32>) -> Result<String> {
    Ok(metrics::format_percent(value, digits_arg(fraction_digits)?))
}

#[napi]
pub fn format_duration(seconds: Option<f64>) -> String {
    metrics::format_duration(seconds)
}
