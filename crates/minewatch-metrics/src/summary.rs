//! Headline figures for one analysis

use crate::confidence::{derive_confidence_metrics, ConfidenceSource};
use crate::tile_area::derive_tile_area_metrics;
use minewatch_core::coerce::parse_numeric;
use minewatch_core::{CanonicalAnalysis, M2_PER_HECTARE, M2_PER_KM2};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedSummary {
    pub total_tiles: u64,
    pub tiles_with_detections: u64,
    pub detection_count: u64,
    pub coverage_pct: Option<f64>,
    pub avg_confidence_pct: Option<f64>,
    pub max_confidence_pct: Option<f64>,
    pub min_confidence_pct: Option<f64>,
    pub confidence_source: ConfidenceSource,
    pub mining_area_m2: f64,
    pub mining_area_ha: f64,
    pub mining_area_km2: f64,
}

/// Reported coverage when tile areas are unknown; fractions become percentages.
fn reported_coverage(analysis: &CanonicalAnalysis) -> Option<f64> {
    let from_stats = ["coveragePercentage", "coverage_percentage"]
        .iter()
        .filter_map(|key| analysis.statistics.get(*key))
        .find_map(parse_numeric);

    let candidate = from_stats.or_else(|| analysis.summary.get("mining_percentage").and_then(parse_numeric))?;
    Some(if candidate > 1.0 { candidate } else { candidate * 100.0 })
}

/// Summary of a canonical record.
pub fn summarize(analysis: &CanonicalAnalysis) -> DerivedSummary {
    let tile_metrics = derive_tile_area_metrics(&analysis.tiles);
    let confidence = derive_confidence_metrics(&analysis.to_value());

    let coverage_pct = tile_metrics.coverage_pct.or_else(|| reported_coverage(analysis));

    let mining_area_m2 = if tile_metrics.total_mining_area_m2 > 0.0 {
        tile_metrics.total_mining_area_m2
    } else {
        analysis.total_mining_area.m2
    };

    DerivedSummary {
        total_tiles: analysis.total_tiles,
        tiles_with_detections: analysis.tiles_with_mining,
        detection_count: analysis.detection_count,
        coverage_pct,
        avg_confidence_pct: confidence.average_pct,
        max_confidence_pct: confidence.max_pct,
        min_confidence_pct: confidence.min_pct,
        confidence_source: confidence.source,
        mining_area_m2,
        mining_area_ha: mining_area_m2 / M2_PER_HECTARE,
        mining_area_km2: mining_area_m2 / M2_PER_KM2,
    }
}

/// Normalize `raw` and summarize it; `None` when there is nothing to normalize.
pub fn extract_summary(raw: &Value) -> Option<DerivedSummary> {
    minewatch_normalize::normalize(raw).map(|analysis| summarize(&analysis))
}
