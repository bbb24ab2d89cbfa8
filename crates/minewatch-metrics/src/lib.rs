//! Minewatch Metrics: figures derived from analysis results
//!
//! Tile and mining area totals, block confidence statistics, the headline
//! summary and the mine-block table, plus the display helpers used to
//! render them.
//!
//! # Example
//!
//! ```ignore
//! use minewatch_metrics::{derive_confidence_metrics, derive_tile_area_metrics, format_percent};
//! use minewatch_normalize::normalize;
//!
//! let canonical = normalize(&raw).unwrap();
//!
//! let area = derive_tile_area_metrics(&canonical.tiles);
//! let confidence = derive_confidence_metrics(&canonical.to_value());
//!
//! println!("coverage {}%", format_percent(area.coverage_pct, 2));
//! println!("confidence from {} samples", confidence.sample_count);
//! ```

pub mod blocks;
pub mod confidence;
pub mod format;
pub mod summary;
pub mod tile_area;

pub use blocks::{build_mine_block_rows, mine_block_rows, BlockSource, MineBlockRow};
pub use confidence::{derive_confidence_metrics, ConfidenceMetrics, ConfidenceSource};
pub use format::{
    checked_fraction_digits, format_average_duration, format_bounds, format_coordinate,
    format_decimal, format_duration, format_elapsed, format_hectares, format_percent,
    to_percent_string, MAX_FRACTION_DIGITS,
};
pub use summary::{extract_summary, summarize, DerivedSummary};
pub use tile_area::{derive_tile_area_metrics, TileAreaMetrics};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tile area and confidence figures for one result, as served together
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetrics {
    pub tiles: TileAreaMetrics,
    pub confidence: ConfidenceMetrics,
}

/// Derive both metric groups from a results object carrying a `tiles` list.
pub fn derive_metrics(results: &Value) -> AnalysisMetrics {
    let tiles = results
        .get("tiles")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    AnalysisMetrics {
        tiles: derive_tile_area_metrics(tiles),
        confidence: derive_confidence_metrics(results),
    }
}
