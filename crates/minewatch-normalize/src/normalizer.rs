//! Result normalization.
//!
//! Folds the historical response shapes of the analysis backend into one
//! [`CanonicalAnalysis`]:
//! - nested `results` payloads vs. flat payloads
//! - summaries duplicated at both levels
//! - snake_case / camelCase field variants
//! - areas in m², hectares or km²
//! - epoch seconds, epoch milliseconds and date strings

use chrono::{DateTime, Utc};
use minewatch_core::coerce::{coerce_count, format_timestamp, is_truthy, parse_numeric, round_count};
use minewatch_core::{AnalysisStatus, CanonicalAnalysis, MiningArea, M2_PER_HECTARE, M2_PER_KM2};
use serde_json::{Map, Number, Value};

use crate::timestamps::{
    elapsed_seconds, find_duration, find_timestamp, COMPLETED_PATHS, CREATED_PATHS, END_PATHS, START_PATHS,
};

/// Legacy spellings back-filled for consumers that still read them.
const START_ALIASES: &[&str] = &["start_time", "startedAt", "started_at"];
const CREATED_ALIASES: &[&str] = &["created_at"];
const END_ALIASES: &[&str] = &["end_time", "finishedAt", "finished_at"];
const COMPLETED_ALIASES: &[&str] = &["completed_at"];
const DURATION_ALIASES: &[&str] = &["duration_seconds", "duration", "runtimeSeconds", "runtime_seconds"];

/// Normalize a raw analysis payload.
///
/// Returns `None` for an unset payload (`null`, `false`, `0`, `""`), which
/// callers use to mean "nothing selected yet". Any other input produces a
/// fully populated record; missing data degrades to defaults.
pub fn normalize(raw: &Value) -> Option<CanonicalAnalysis> {
    if !is_truthy(raw) {
        return None;
    }

    let empty = Value::Object(Map::new());
    let top = if raw.is_object() { raw } else { &empty };

    let nested = top
        .get("results")
        .filter(|results| results.as_object().is_some_and(|m| !m.is_empty()));
    if nested.is_some() {
        tracing::debug!("Normalizing nested results payload");
    }
    let primary = nested.unwrap_or(top);

    let summary = merge_objects(primary.get("summary"), top.get("summary"));
    let tiles = first_array(primary, top, "tiles");
    let detections = first_array(primary, top, "detections");

    let total_tiles = primary
        .get("totalTiles")
        .and_then(coerce_count)
        .or_else(|| summary.get("total_tiles").and_then(coerce_count))
        .unwrap_or(tiles.len() as u64);

    let tiles_processed = primary
        .get("tilesProcessed")
        .and_then(coerce_count)
        .unwrap_or(total_tiles);

    let tiles_with_mining = primary
        .get("tilesWithMining")
        .and_then(coerce_count)
        .or_else(|| summary.get("tiles_with_detections").and_then(coerce_count))
        .unwrap_or_else(|| count_tiles_with_mining(&tiles));

    let detection_count = primary
        .get("detectionCount")
        .and_then(coerce_count)
        .or_else(|| summary.get("mine_block_count").and_then(coerce_count))
        .unwrap_or(detections.len() as u64);

    let total_mining_area = resolve_mining_area(primary, top, &summary);
    let statistics = resolve_statistics(primary, top, &summary);

    let merged_blocks = first_present(&[
        primary.get("mergedBlocks"),
        top.get("mergedBlocks"),
        top.get("merged_blocks"),
    ]);
    let block_tracking = first_present(&[primary.get("blockTracking"), top.get("blockTracking")]);

    let raw_status = first_present(&[primary.get("status"), top.get("status")]);
    let status = raw_status.as_ref().and_then(Value::as_str).and_then(AnalysisStatus::parse);

    let candidate_sources: Vec<&Value> = [
        Some(primary),
        Some(top),
        primary.get("metadata"),
        top.get("metadata"),
        primary.get("summary"),
        top.get("summary"),
        primary.get("statistics"),
        top.get("statistics"),
    ]
    .into_iter()
    .flatten()
    .filter(|source| source.is_object())
    .collect();

    let created_at = find_timestamp(&candidate_sources, CREATED_PATHS);
    let completed_at = find_timestamp(&candidate_sources, COMPLETED_PATHS);
    let start_time = find_timestamp(&candidate_sources, START_PATHS).or(created_at);
    let end_time = find_timestamp(&candidate_sources, END_PATHS).or(completed_at);

    let mut duration = find_duration(primary, top, &summary, &statistics);
    if duration.map_or(true, |d| d == 0.0) {
        if let (Some(start), Some(end)) = (&start_time, &end_time) {
            if let Some(elapsed) = elapsed_seconds(start, end) {
                tracing::debug!(elapsed, "Deriving duration from start/end timestamps");
                duration = Some(elapsed);
            }
        }
    }
    let duration_seconds = duration.map(round_count);

    let created_at = created_at.or(start_time);
    let completed_at = completed_at.or(end_time);

    let mut passthrough = primary.as_object().cloned().unwrap_or_default();
    for key in CanonicalAnalysis::CANONICAL_KEYS {
        // An unrecognized status stays visible in its raw form.
        if key == "status" && status.is_none() {
            continue;
        }
        passthrough.remove(key);
    }

    backfill_timestamp(&mut passthrough, START_ALIASES, start_time.as_ref());
    backfill_timestamp(&mut passthrough, CREATED_ALIASES, created_at.as_ref());
    backfill_timestamp(&mut passthrough, END_ALIASES, end_time.as_ref());
    backfill_timestamp(&mut passthrough, COMPLETED_ALIASES, completed_at.as_ref());
    if let Some(seconds) = duration_seconds {
        for key in DURATION_ALIASES {
            passthrough.entry(key.to_string()).or_insert_with(|| Value::from(seconds));
        }
    }

    Some(CanonicalAnalysis {
        passthrough,
        status,
        summary,
        tiles,
        detections,
        total_tiles,
        tiles_processed,
        tiles_with_mining,
        detection_count,
        total_mining_area,
        merged_blocks,
        block_tracking,
        statistics,
        start_time,
        end_time,
        created_at,
        completed_at,
        duration_seconds,
    })
}

/// Shallow merge of two optional objects; keys of `overlay` win.
fn merge_objects(base: Option<&Value>, overlay: Option<&Value>) -> Map<String, Value> {
    let mut merged = Map::new();
    for source in [base, overlay].into_iter().flatten() {
        if let Some(object) = source.as_object() {
            for (key, value) in object {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

fn first_array(primary: &Value, top: &Value, key: &str) -> Vec<Value> {
    primary
        .get(key)
        .and_then(Value::as_array)
        .or_else(|| top.get(key).and_then(Value::as_array))
        .cloned()
        .unwrap_or_default()
}

fn first_present(candidates: &[Option<&Value>]) -> Option<Value> {
    candidates
        .iter()
        .flatten()
        .find(|value| !value.is_null())
        .map(|value| (*value).clone())
}

pub(crate) fn count_tiles_with_mining(tiles: &[Value]) -> u64 {
    tiles
        .iter()
        .filter(|tile| {
            tile.get("mining_detected").is_some_and(is_truthy) || tile.get("miningDetected").is_some_and(is_truthy)
        })
        .count() as u64
}

fn resolve_mining_area(primary: &Value, top: &Value, summary: &Map<String, Value>) -> MiningArea {
    let area = primary
        .get("totalMiningArea")
        .and_then(Value::as_object)
        .or_else(|| top.get("totalMiningArea").and_then(Value::as_object));
    let field = |key: &str| area.and_then(|a| a.get(key));

    let m2 = [field("m2"), field("squareMeters"), summary.get("mining_area_m2")]
        .into_iter()
        .flatten()
        .find_map(parse_numeric)
        .unwrap_or(0.0);

    let hectares = field("hectares").and_then(parse_numeric).unwrap_or(m2 / M2_PER_HECTARE);
    let km2 = field("km2").and_then(parse_numeric).unwrap_or(m2 / M2_PER_KM2);

    let mut extra = area.cloned().unwrap_or_default();
    for key in ["m2", "hectares", "km2"] {
        extra.remove(key);
    }

    MiningArea { m2, hectares, km2, extra }
}

fn resolve_statistics(primary: &Value, top: &Value, summary: &Map<String, Value>) -> Map<String, Value> {
    let mut statistics = merge_objects(primary.get("statistics"), top.get("statistics"));

    if !statistics.contains_key("avgConfidence") {
        let backfill = summary
            .get("confidence")
            .and_then(Value::as_f64)
            .and_then(|fraction| Number::from_f64(fraction * 100.0));
        if let Some(percent) = backfill {
            statistics.insert("avgConfidence".to_string(), Value::Number(percent));
        }
    }

    if !statistics.contains_key("coveragePercentage") {
        if let Some(coverage) = summary.get("mining_percentage").filter(|v| v.is_number()) {
            statistics.insert("coveragePercentage".to_string(), coverage.clone());
        }
    }

    statistics
}

fn backfill_timestamp(
    target: &mut Map<String, Value>,
    keys: &[&str],
    value: Option<&DateTime<Utc>>,
) {
    let Some(ts) = value else {
        return;
    };
    let text = format_timestamp(ts);
    for key in keys {
        target
            .entry(key.to_string())
            .or_insert_with(|| Value::String(text.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unset_payloads() {
        assert!(normalize(&json!(null)).is_none());
        assert!(normalize(&json!(false)).is_none());
        assert!(normalize(&json!("")).is_none());
        assert!(normalize(&json!(0)).is_none());
    }

    #[test]
    fn test_non_object_defaults() {
        let result = normalize(&json!([1, 2, 3])).unwrap();
        assert_eq!(result.total_tiles, 0);
        assert!(result.tiles.is_empty());
        assert!(result.passthrough.is_empty());
        assert!(result.start_time.is_none());
        assert_eq!(result.total_mining_area.m2, 0.0);
    }

    #[test]
    fn test_empty_nested_results_uses_top_level() {
        let result = normalize(&json!({"results": {}, "totalTiles": 4})).unwrap();
        assert_eq!(result.total_tiles, 4);
        assert_eq!(result.tiles_processed, 4);
    }

    #[test]
    fn test_summary_merge_top_level_wins() {
        let raw = json!({
            "summary": {"confidence": 0.5},
            "results": {
                "summary": {"confidence": 0.25, "total_tiles": 7}
            }
        });

        let result = normalize(&raw).unwrap();
        assert_eq!(result.summary["confidence"], 0.5);
        assert_eq!(result.summary["total_tiles"], 7);
        assert_eq!(result.total_tiles, 7);
        assert_eq!(result.statistics["avgConfidence"], 50.0);
    }

    #[test]
    fn test_count_fallbacks() {
        let raw = json!({
            "tiles": [
                {"tile_id": "a", "mining_detected": true},
                {"tile_id": "b", "miningDetected": 1},
                {"tile_id": "c", "mining_detected": false}
            ],
            "detections": [{"id": 1}],
            "summary": {"mine_block_count": "5"}
        });

        let result = normalize(&raw).unwrap();
        assert_eq!(result.total_tiles, 3);
        assert_eq!(result.tiles_with_mining, 2);
        assert_eq!(result.detection_count, 5);
    }

    #[test]
    fn test_mining_area_explicit_units_kept() {
        let raw = json!({"totalMiningArea": {"m2": 50_000, "hectares": 4.9, "label": "approx"}});
        let area = normalize(&raw).unwrap().total_mining_area;

        assert_eq!(area.m2, 50_000.0);
        assert_eq!(area.hectares, 4.9);
        assert!((area.km2 - 0.05).abs() < 1e-12);
        assert_eq!(area.extra["label"], "approx");
    }

    #[test]
    fn test_coverage_backfill_requires_number() {
        let raw = json!({"summary": {"mining_percentage": "12"}});
        let result = normalize(&raw).unwrap();
        assert!(!result.statistics.contains_key("coveragePercentage"));

        let raw = json!({"summary": {"mining_percentage": 12.5}});
        let result = normalize(&raw).unwrap();
        assert_eq!(result.statistics["coveragePercentage"], 12.5);
    }

    #[test]
    fn test_blocks_passthrough() {
        let raw = json!({
            "results": {"tiles": []},
            "merged_blocks": {"type": "FeatureCollection", "features": []},
            "blockTracking": null
        });

        let result = normalize(&raw).unwrap();
        assert_eq!(result.merged_blocks.unwrap()["type"], "FeatureCollection");
        assert!(result.block_tracking.is_none());
    }

    #[test]
    fn test_unknown_status_preserved_raw() {
        let result = normalize(&json!({"status": "queued"})).unwrap();
        assert!(result.status.is_none());
        assert_eq!(result.passthrough["status"], "queued");

        let result = normalize(&json!({"status": "completed"})).unwrap();
        assert_eq!(result.status, Some(AnalysisStatus::Completed));
        assert!(!result.passthrough.contains_key("status"));
    }

    #[test]
    fn test_zero_duration_replaced_by_elapsed() {
        let raw = json!({
            "duration": 0,
            "startTime": "2024-01-01T00:00:00Z",
            "endTime": "2024-01-01T00:01:30Z"
        });

        let result = normalize(&raw).unwrap();
        assert_eq!(result.duration_seconds, Some(90));
        // the explicit legacy field is never overwritten
        assert_eq!(result.passthrough["duration"], 0);
    }

    #[test]
    fn test_aliases_backfilled_only_when_missing() {
        let raw = json!({
            "started_at": "legacy",
            "startTime": 1_704_067_200,
            "runtimeMs": 2_400
        });

        let result = normalize(&raw).unwrap();
        assert_eq!(result.passthrough["started_at"], "legacy");
        assert_eq!(result.passthrough["start_time"], "2024-01-01T00:00:00.000Z");
        assert_eq!(result.passthrough["created_at"], "2024-01-01T00:00:00.000Z");
        assert_eq!(result.passthrough["runtimeSeconds"], 2);
        assert_eq!(result.duration_seconds, Some(2));
        assert_eq!(result.created_at, result.start_time);
        assert!(!result.passthrough.contains_key("startTime"));
    }
}
