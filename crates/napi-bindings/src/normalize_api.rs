//! NAPI bindings for the result normalizer

use napi::bindgen_prelude::*;

use crate::{parse_json, to_json};

/// Normalize a raw analysis payload; returns `"null"` when there is nothing to normalize
#[napi]
pub fn normalize_analysis_results(raw_json: String) -> Result<String> {
    let raw = parse_json(&raw_json)?;
    to_json(&minewatch_normalize::normalize(&raw))
}

/// Confidence as a 0-100 percentage, or null when unreadable
#[napi]
pub fn normalize_confidence_value(value_json: String) -> Result<Option<f64>> {
    let value = parse_json(&value_json)?;
    Ok(minewatch_core::coerce::normalize_confidence(&value))
}
