//! Minewatch Normalize: raw analysis payload to canonical record
//!
//! The remote detection backend has returned results in several shapes over
//! its lifetime. This crate folds all of them into one
//! [`CanonicalAnalysis`](minewatch_core::CanonicalAnalysis).
//!
//! # Example
//!
//! ```ignore
//! use minewatch_normalize::normalize;
//! use serde_json::json;
//!
//! let raw = json!({
//!     "status": "completed",
//!     "results": {
//!         "tiles": [],
//!         "summary": {"mining_area_m2": "12345.6"}
//!     }
//! });
//!
//! let canonical = normalize(&raw).unwrap();
//! println!("{} ha", canonical.total_mining_area.hectares);
//! ```

pub mod normalizer;
pub mod timestamps;

pub use normalizer::normalize;

use minewatch_core::{parse_payload, CanonicalAnalysis, MinewatchError};

/// Parse and normalize a JSON document in one step.
pub fn normalize_str(text: &str) -> Result<Option<CanonicalAnalysis>, MinewatchError> {
    let raw = parse_payload(text)?;
    Ok(normalize(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_str() {
        let result = normalize_str(r#"{"totalTiles": 2}"#).unwrap().unwrap();
        assert_eq!(result.total_tiles, 2);

        assert!(normalize_str("null").unwrap().is_none());
        assert!(normalize_str("{").is_err());
    }
}
