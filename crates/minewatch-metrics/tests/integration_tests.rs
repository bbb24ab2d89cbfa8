//! Integration tests for minewatch-metrics with recorded payload fixtures.
//!
//! Each fixture is normalized first, then run through the derivations the
//! dashboard views rely on.

use minewatch_metrics::{
    build_mine_block_rows, derive_confidence_metrics, derive_tile_area_metrics, extract_summary,
    format_hectares, BlockSource, ConfidenceSource,
};
use minewatch_normalize::normalize;
use serde_json::Value;

/// Fixture directory relative to the workspace root
const FIXTURES_DIR: &str = "testing/fixtures/analyses";

fn fixture(name: &str) -> Value {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = std::path::Path::new(&manifest_dir).parent().unwrap().parent().unwrap();
    let path = workspace_root.join(FIXTURES_DIR).join(name);
    let text = std::fs::read_to_string(&path).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn close(actual: Option<f64>, expected: f64) -> bool {
    actual.is_some_and(|value| (value - expected).abs() < 1e-9)
}

// =============================================================================
// Tile area
// =============================================================================

#[test]
fn test_wrapped_tile_area() {
    let canonical = normalize(&fixture("wrapped_completed.json")).unwrap();
    let metrics = derive_tile_area_metrics(&canonical.tiles);

    // the mosaic tile is left out, tile_2 is sized from its mask
    assert_eq!(metrics.total_tile_area_m2, 60_000.0);
    assert_eq!(metrics.total_mining_area_m2, 4_200.0);
    assert!(close(metrics.coverage_pct, 7.0));
}

#[test]
fn test_flat_legacy_tile_area() {
    let canonical = normalize(&fixture("flat_legacy.json")).unwrap();
    let metrics = derive_tile_area_metrics(&canonical.tiles);

    assert_eq!(metrics.total_tile_area_m2, 80_000.0);
    assert!((metrics.total_mining_area_m2 - 2_000.0).abs() < 1e-9);
    assert!(close(metrics.coverage_pct, 2.5));
}

// =============================================================================
// Confidence
// =============================================================================

#[test]
fn test_wrapped_confidence_samples() {
    let canonical = normalize(&fixture("wrapped_completed.json")).unwrap();
    let metrics = derive_confidence_metrics(&canonical.to_value());

    assert_eq!(metrics.source, ConfidenceSource::Samples);
    // PB-001 and PB-002 appear in several lists but are sampled once
    assert_eq!(metrics.sample_count, 3);
    assert!(close(metrics.max_pct, 90.0));
    assert!(close(metrics.min_pct, 55.0));
    assert!(close(metrics.average_pct, 215.0 / 3.0));
}

#[test]
fn test_flat_legacy_has_no_confidence() {
    let canonical = normalize(&fixture("flat_legacy.json")).unwrap();
    let metrics = derive_confidence_metrics(&canonical.to_value());

    assert_eq!(metrics.source, ConfidenceSource::Summary);
    assert_eq!(metrics.sample_count, 0);
    assert!(metrics.average_pct.is_none());
}

// =============================================================================
// Summary
// =============================================================================

#[test]
fn test_wrapped_summary() {
    let summary = extract_summary(&fixture("wrapped_completed.json")).unwrap();

    assert_eq!(summary.total_tiles, 3);
    assert_eq!(summary.tiles_with_detections, 2);
    assert_eq!(summary.detection_count, 3);
    assert!(close(summary.coverage_pct, 7.0));
    assert_eq!(summary.mining_area_m2, 4_200.0);
    assert_eq!(format_hectares(Some(summary.mining_area_m2), 2), "0.42");
    assert_eq!(summary.confidence_source, ConfidenceSource::Samples);
}

#[test]
fn test_flat_legacy_summary() {
    let summary = extract_summary(&fixture("flat_legacy.json")).unwrap();

    assert_eq!(summary.total_tiles, 2);
    assert_eq!(summary.tiles_with_detections, 1);
    // tile blocks outweigh the reported merged area
    assert!((summary.mining_area_m2 - 2_000.0).abs() < 1e-9);
    assert!(close(summary.coverage_pct, 2.5));
}

// =============================================================================
// Mine-block rows
// =============================================================================

#[test]
fn test_wrapped_rows_order() {
    let rows = build_mine_block_rows(&fixture("wrapped_completed.json"));
    let ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();

    assert_eq!(
        ids,
        vec!["merged-PB-001", "PB-001", "PB-002", "tile-PB-001", "tile-b-2", "tile-PB-002"]
    );
}

#[test]
fn test_wrapped_row_contents() {
    let rows = build_mine_block_rows(&fixture("wrapped_completed.json"));

    let merged = &rows[0];
    assert_eq!(merged.source, BlockSource::Merged);
    assert!(merged.is_merged);
    assert_eq!(merged.label, "Pit A merged");
    assert_eq!(merged.area_ha, 0.15);

    let tracked = &rows[1];
    assert_eq!(tracked.label, "Pit A");
    assert_eq!(tracked.tile_id.as_deref(), Some("tile_0"));
    assert_eq!(tracked.block_index, Some(1.0));
    assert_eq!(tracked.centroid_lon, Some(85.12));
    assert_eq!(tracked.centroid_lat, Some(23.71));

    let tile_block = &rows[3];
    assert_eq!(tile_block.label, "tile_0 · Block 1");
    assert_eq!(tile_block.persistent_id.as_deref(), Some("PB-001"));
    assert_eq!(tile_block.bounds, Some([85.11, 23.70, 85.13, 23.72]));

    // pixel areas are not converted for the table
    assert_eq!(rows[5].area_ha, 0.0);
    assert!(close(rows[5].confidence_pct, 55.0));
}

#[test]
fn test_flat_legacy_has_no_rows() {
    assert!(build_mine_block_rows(&fixture("flat_legacy.json")).is_empty());
}
