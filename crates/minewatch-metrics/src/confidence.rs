//! Detection confidence statistics
//!
//! Per-block confidences are sampled from tracked blocks, merged block
//! features and per-tile blocks, in that order. A block reported by several
//! of those lists is sampled once. When no block carries a usable
//! confidence, the scalar summary confidence stands in for all three
//! statistics.

use minewatch_core::coerce::{id_string, is_truthy, normalize_confidence, pick, properties_of};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

const TRACKED_ID_KEYS: &[&str] = &["persistentId", "persistent_id", "blockId", "block_id"];
const TRACKED_VALUE_KEYS: &[&str] = &["avgConfidence", "avg_confidence", "confidence"];
const MERGED_ID_KEYS: &[&str] = &["persistent_id", "persistentId", "block_id", "id"];
const TILE_ID_KEYS: &[&str] = &["persistent_id", "persistentId", "block_id", "blockId"];
const FEATURE_VALUE_KEYS: &[&str] = &["avg_confidence", "confidence", "mean_confidence"];

/// Where the confidence figures came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceSource {
    Samples,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceMetrics {
    pub average_pct: Option<f64>,
    pub max_pct: Option<f64>,
    pub min_pct: Option<f64>,
    pub sample_count: usize,
    pub source: ConfidenceSource,
}

/// Samples keyed by block identity; the first value seen for a key wins.
#[derive(Debug, Default)]
struct SampleSet {
    seen: HashSet<String>,
    values: Vec<f64>,
}

impl SampleSet {
    fn register(&mut self, identifier: Option<String>, prefix: &str, index: usize, raw: Option<&Value>) {
        let Some(value) = raw.and_then(normalize_confidence) else {
            return;
        };

        let key = match identifier {
            Some(id) if !id.is_empty() => format!("id:{}", id.to_lowercase()),
            _ => format!("{}:{}", prefix, index),
        };

        if self.seen.insert(key) {
            self.values.push(value);
        }
    }
}

fn first_of<'a>(results: &'a Value, paths: &[&[&str]]) -> Option<&'a Value> {
    paths.iter().find_map(|path| {
        let found = path.iter().try_fold(results, |acc, key| acc.get(*key))?;
        (!found.is_null()).then_some(found)
    })
}

fn collect_tracked(results: &Value, samples: &mut SampleSet) {
    let blocks = first_of(
        results,
        &[
            &["blockTracking", "blocks"],
            &["block_tracking", "blocks"],
            &["trackedBlocks"],
            &["tracked_blocks"],
        ],
    );

    if let Some(blocks) = blocks.and_then(Value::as_array) {
        for (index, block) in blocks.iter().enumerate() {
            samples.register(
                pick(block, TRACKED_ID_KEYS).map(id_string),
                "tracked",
                index,
                pick(block, TRACKED_VALUE_KEYS),
            );
        }
    }
}

fn merged_features(results: &Value) -> &[Value] {
    let collection = first_of(
        results,
        &[
            &["mergedBlocks"],
            &["merged_blocks"],
            &["merged_block_collection"],
            &["mergedBlockGeoJson"],
        ],
    );

    match collection {
        Some(value) => value
            .get("features")
            .and_then(Value::as_array)
            .or_else(|| value.as_array())
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        None => &[],
    }
}

fn collect_merged(results: &Value, samples: &mut SampleSet) {
    for (index, feature) in merged_features(results).iter().enumerate() {
        let props = properties_of(feature);
        samples.register(
            pick(props, MERGED_ID_KEYS).map(id_string),
            "merged",
            index,
            pick(props, FEATURE_VALUE_KEYS),
        );
    }
}

fn collect_tiles(results: &Value, samples: &mut SampleSet) {
    let Some(tiles) = results.get("tiles").and_then(Value::as_array) else {
        return;
    };

    for (tile_idx, tile) in tiles.iter().enumerate() {
        let blocks = tile
            .get("mine_blocks")
            .and_then(Value::as_array)
            .or_else(|| tile.get("blocks").and_then(Value::as_array));
        let Some(blocks) = blocks else {
            continue;
        };

        let tile_id = pick(tile, &["tile_id", "tileId"]).filter(|id| is_truthy(id));
        let prefix = format!("tile-{}", tile_idx);

        for (block_idx, block) in blocks.iter().enumerate() {
            let props = properties_of(block);
            let identifier = pick(props, TILE_ID_KEYS)
                .map(id_string)
                .or_else(|| tile_id.map(|id| format!("{}-{}", id_string(id), block_idx)));

            samples.register(identifier, &prefix, block_idx, pick(props, FEATURE_VALUE_KEYS));
        }
    }
}

fn summary_fallback(results: &Value) -> Option<f64> {
    if let Some(confidence) = results.get("summary").and_then(|summary| summary.get("confidence")) {
        if let Some(value) = normalize_confidence(confidence) {
            return Some(value);
        }
    }

    let statistics = pick(results, &["statistics", "summary_statistics", "stats"])?;
    ["avgConfidence", "averageConfidence", "confidence"]
        .iter()
        .filter_map(|key| statistics.get(*key))
        .find_map(normalize_confidence)
}

/// Confidence statistics for an analysis result, as percentages.
pub fn derive_confidence_metrics(results: &Value) -> ConfidenceMetrics {
    let mut samples = SampleSet::default();

    if is_truthy(results) {
        collect_tracked(results, &mut samples);
        collect_merged(results, &mut samples);
        collect_tiles(results, &mut samples);
    }

    let values = samples.values;
    if !values.is_empty() {
        let sum: f64 = values.iter().sum();
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);

        return ConfidenceMetrics {
            average_pct: Some(sum / values.len() as f64),
            max_pct: Some(max),
            min_pct: Some(min),
            sample_count: values.len(),
            source: ConfidenceSource::Samples,
        };
    }

    let fallback = if is_truthy(results) { summary_fallback(results) } else { None };
    tracing::debug!(found = fallback.is_some(), "No block confidences, using summary value");

    ConfidenceMetrics {
        average_pct: fallback,
        max_pct: fallback,
        min_pct: fallback,
        sample_count: usize::from(fallback.is_some()),
        source: ConfidenceSource::Summary,
    }
}
