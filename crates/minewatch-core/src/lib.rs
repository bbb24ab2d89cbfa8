//! Minewatch Core: canonical analysis model and shared coercion
//!
//! Everything the normalizer, the metrics deriver and the poller agree on:
//! the canonical analysis record, the lenient numeric/timestamp coercers
//! used to read untrusted backend payloads, and the caller-owned
//! [`AnalysisSnapshot`] that tracks a running job.

pub mod coerce;
pub mod data_model;
pub mod error;
pub mod snapshot;

pub use data_model::{AnalysisStatus, CanonicalAnalysis, MiningArea};
pub use error::MinewatchError;
pub use snapshot::AnalysisSnapshot;

use serde_json::Value;

/// Minewatch engine version
pub const MINEWATCH_VERSION: &str = "1.0.0";

/// Sentinel-2 ground resolution in meters
pub const SENTINEL_RESOLUTION_METERS: f64 = 10.0;

/// Ground area covered by one mask pixel
pub const AREA_PER_PIXEL_M2: f64 = SENTINEL_RESOLUTION_METERS * SENTINEL_RESOLUTION_METERS;

pub const M2_PER_HECTARE: f64 = 10_000.0;
pub const M2_PER_KM2: f64 = 1_000_000.0;

/// Parse a JSON document received at an outer boundary (HTTP body, N-API string).
pub fn parse_payload(text: &str) -> Result<Value, MinewatchError> {
    serde_json::from_str(text).map_err(|e| MinewatchError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload() {
        let value = parse_payload(r#"{"status": "processing"}"#).unwrap();
        assert_eq!(value["status"], "processing");

        let err = parse_payload("{not json").unwrap_err();
        assert!(err.to_string().starts_with("PARSE/"));
    }

    #[test]
    fn test_pixel_area() {
        assert_eq!(AREA_PER_PIXEL_M2, 100.0);
    }
}
