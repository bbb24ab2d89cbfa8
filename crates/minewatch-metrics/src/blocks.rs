//! Mine-block table rows
//!
//! Gathers one row per mine block from the tracked block list, the merged
//! block features and the per-tile block lists. Rows sharing an id are
//! folded together.

use minewatch_core::coerce::{
    id_string, is_truthy, normalize_confidence, parse_numeric, pick, properties_of, to_number,
};
use minewatch_core::{CanonicalAnalysis, M2_PER_HECTARE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockSource {
    Merged,
    Tile,
}

impl BlockSource {
    fn as_str(&self) -> &'static str {
        match self {
            BlockSource::Merged => "Merged",
            BlockSource::Tile => "Tile",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MineBlockRow {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile_id: Option<String>,
    pub area_ha: f64,
    pub confidence_pct: Option<f64>,
    pub source: BlockSource,
    pub is_merged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_index: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid_lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid_lon: Option<f64>,
    /// `[min_lon, min_lat, max_lon, max_lat]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<[f64; 4]>,
}

impl MineBlockRow {
    fn key(&self) -> String {
        if self.id.is_empty() {
            format!("{}-{}", self.source.as_str(), self.label)
        } else {
            self.id.clone()
        }
    }

    /// Fold a later report of the same block into this row.
    fn absorb(&mut self, newer: MineBlockRow) {
        let source = if self.source == BlockSource::Merged || newer.source == BlockSource::Merged {
            BlockSource::Merged
        } else {
            self.source
        };

        self.id = newer.id;
        self.label = newer.label;
        self.area_ha = newer.area_ha;
        self.source = source;
        self.is_merged = self.is_merged || newer.is_merged;

        if newer.tile_id.is_some() {
            self.tile_id = newer.tile_id;
        }
        if newer.confidence_pct.is_some() {
            self.confidence_pct = newer.confidence_pct;
        }
        if newer.persistent_id.is_some() {
            self.persistent_id = newer.persistent_id;
        }
        if newer.block_index.is_some() {
            self.block_index = newer.block_index;
        }
        if newer.centroid_lat.is_some() {
            self.centroid_lat = newer.centroid_lat;
        }
        if newer.centroid_lon.is_some() {
            self.centroid_lon = newer.centroid_lon;
        }
        if newer.bounds.is_some() {
            self.bounds = newer.bounds;
        }
    }
}

/// Rows in insertion order, merged by key
#[derive(Default)]
struct RowTable {
    index: HashMap<String, usize>,
    rows: Vec<MineBlockRow>,
}

impl RowTable {
    fn register(&mut self, row: MineBlockRow) {
        let key = row.key();
        match self.index.get(&key) {
            Some(&slot) => self.rows[slot].absorb(row),
            None => {
                self.index.insert(key, self.rows.len());
                self.rows.push(row);
            }
        }
    }
}

/// First truthy value among `keys`, as text.
fn truthy_text(source: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| source.get(*key))
        .find(|value| is_truthy(value))
        .map(id_string)
}

/// Any finite JSON number; fractional indices are kept as given.
fn finite_index(value: &Value) -> Option<f64> {
    value.as_f64().filter(|f| f.is_finite())
}

fn bounds_of(value: Option<&Value>) -> Option<[f64; 4]> {
    let items = value?.as_array()?;
    if items.len() != 4 {
        return None;
    }
    let mut bounds = [0.0; 4];
    for (slot, item) in bounds.iter_mut().zip(items) {
        *slot = to_number(item)?;
    }
    Some(bounds)
}

fn array_field<'a>(source: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    keys.iter().find_map(|key| source.get(*key).and_then(Value::as_array))
}

fn centroid_part(centroid: Option<&Vec<Value>>, position: usize) -> Option<&Value> {
    centroid.and_then(|items| items.get(position)).filter(|v| !v.is_null())
}

/// Hectares from `area_ha`, else `area_m2`, else 0.
fn feature_area_ha(props: &Value) -> f64 {
    if let Some(ha) = pick(props, &["area_ha", "areaHa"]).and_then(parse_numeric) {
        return ha;
    }
    pick(props, &["area_m2", "areaM2"])
        .and_then(parse_numeric)
        .map(|m2| m2 / M2_PER_HECTARE)
        .unwrap_or(0.0)
}

fn feature_confidence(props: &Value) -> Option<f64> {
    pick(props, &["avg_confidence", "confidence", "mean_confidence"]).and_then(normalize_confidence)
}

fn tracked_rows(tracking: Option<&Value>, table: &mut RowTable) {
    let Some(blocks) = tracking.and_then(|t| t.get("blocks")).and_then(Value::as_array) else {
        return;
    };

    for (index, block) in blocks.iter().enumerate() {
        let id = pick(block, &["persistentId", "persistent_id", "blockId", "block_id"])
            .map(id_string)
            .unwrap_or_else(|| format!("tracked-{}", index));

        let centroid = array_field(block, &["centroid", "label_position"]);

        let area_ha = match block.get("areaHa").and_then(Value::as_f64) {
            Some(ha) => ha,
            None => pick(block, &["areaM2", "area_m2"])
                .and_then(parse_numeric)
                .map(|m2| m2 / M2_PER_HECTARE)
                .unwrap_or(0.0),
        };

        let block_index = match block.get("sequence") {
            Some(seq) if seq.is_number() => finite_index(seq),
            _ => block.get("block_index").and_then(finite_index),
        };

        table.register(MineBlockRow {
            id,
            label: truthy_text(block, &["name", "label", "blockId", "block_id"])
                .unwrap_or_else(|| format!("Block {}", index + 1)),
            tile_id: truthy_text(block, &["tileId", "tile_id"]),
            area_ha,
            confidence_pct: pick(block, &["avgConfidence", "avg_confidence", "confidence"])
                .and_then(normalize_confidence),
            source: BlockSource::Tile,
            is_merged: pick(block, &["isMerged", "is_merged"]).map(is_truthy).unwrap_or(false),
            persistent_id: truthy_text(block, &["persistentId", "persistent_id"]),
            block_index,
            centroid_lat: centroid_part(centroid, 1).and_then(parse_numeric),
            centroid_lon: centroid_part(centroid, 0).and_then(parse_numeric),
            bounds: bounds_of(block.get("bounds")),
        });
    }
}

fn merged_rows(merged: Option<&Value>, table: &mut RowTable) {
    let Some(features) = merged.and_then(|m| m.get("features")).and_then(Value::as_array) else {
        return;
    };

    for (index, feature) in features.iter().enumerate() {
        let props = properties_of(feature);
        let row_id = pick(props, &["persistent_id", "persistentId", "block_id", "id"])
            .map(id_string)
            .unwrap_or_else(|| format!("merged-{}", index));

        let centroid = array_field(props, &["label_position", "centroid"]);

        table.register(MineBlockRow {
            id: format!("merged-{}", row_id),
            label: truthy_text(props, &["name", "block_id"])
                .unwrap_or_else(|| format!("Merged Block {}", index + 1)),
            tile_id: truthy_text(props, &["tile_id"]),
            area_ha: feature_area_ha(props),
            confidence_pct: feature_confidence(props),
            source: BlockSource::Merged,
            is_merged: true,
            persistent_id: truthy_text(props, &["persistent_id", "persistentId"]),
            block_index: pick(props, &["block_index", "index"]).and_then(finite_index),
            centroid_lat: centroid_part(centroid, 1)
                .or_else(|| props.get("centroid_lat"))
                .and_then(parse_numeric),
            centroid_lon: centroid_part(centroid, 0)
                .or_else(|| props.get("centroid_lon"))
                .and_then(parse_numeric),
            bounds: bounds_of(props.get("bbox")),
        });
    }
}

fn tile_rows(tiles: &[Value], table: &mut RowTable) {
    for (tile_idx, tile) in tiles.iter().enumerate() {
        let blocks = match tile.get("mine_blocks").and_then(Value::as_array) {
            Some(blocks) if !blocks.is_empty() => blocks,
            _ => continue,
        };

        let tile_label = pick(tile, &["tile_label", "tileLabel", "tile_id", "tileId"])
            .map(id_string)
            .unwrap_or_else(|| match tile.get("tile_index").and_then(Value::as_f64) {
                Some(n) => format!("tile_{}", id_string(&Value::from(n))),
                None => format!("Tile {}", tile_idx + 1),
            });
        let display_tile_id = pick(tile, &["tile_id", "tileId"])
            .map(id_string)
            .unwrap_or_else(|| tile_label.clone());

        for (block_idx, block) in blocks.iter().enumerate() {
            let props = properties_of(block);
            let row_id = pick(props, &["persistent_id", "persistentId", "block_id", "blockId"])
                .map(id_string)
                .unwrap_or_else(|| format!("{}-block-{}", display_tile_id, block_idx + 1));

            let centroid = array_field(props, &["label_position", "centroid"]);

            table.register(MineBlockRow {
                id: format!("tile-{}", row_id),
                label: truthy_text(props, &["name"])
                    .unwrap_or_else(|| format!("{} · Block {}", tile_label, block_idx + 1)),
                tile_id: Some(display_tile_id.clone()),
                area_ha: feature_area_ha(props),
                confidence_pct: feature_confidence(props),
                source: BlockSource::Tile,
                is_merged: props.get("is_merged").map(is_truthy).unwrap_or(false),
                persistent_id: truthy_text(props, &["persistent_id", "persistentId"]),
                block_index: pick(props, &["block_index", "index"]).and_then(finite_index),
                centroid_lat: centroid_part(centroid, 1).and_then(parse_numeric),
                centroid_lon: centroid_part(centroid, 0).and_then(parse_numeric),
                bounds: bounds_of(props.get("bbox")),
            });
        }
    }
}

/// Indexed rows first by index, then merged before tile rows, then larger areas first.
fn row_order(a: &MineBlockRow, b: &MineBlockRow) -> Ordering {
    let rank = |source: BlockSource| match source {
        BlockSource::Merged => 0,
        BlockSource::Tile => 1,
    };

    a.block_index
        .is_none()
        .cmp(&b.block_index.is_none())
        .then_with(|| match (a.block_index, b.block_index) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        })
        .then_with(|| rank(a.source).cmp(&rank(b.source)))
        .then_with(|| b.area_ha.total_cmp(&a.area_ha))
}

/// Table rows for every mine block of a canonical record.
pub fn mine_block_rows(analysis: &CanonicalAnalysis) -> Vec<MineBlockRow> {
    let mut table = RowTable::default();

    tracked_rows(analysis.block_tracking.as_ref(), &mut table);
    merged_rows(analysis.merged_blocks.as_ref(), &mut table);
    tile_rows(&analysis.tiles, &mut table);

    let mut rows = table.rows;
    rows.sort_by(row_order);
    rows
}

/// Normalize `raw` and build its mine-block rows.
pub fn build_mine_block_rows(raw: &Value) -> Vec<MineBlockRow> {
    match minewatch_normalize::normalize(raw) {
        Some(analysis) => mine_block_rows(&analysis),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_payload_has_no_rows() {
        assert!(build_mine_block_rows(&Value::Null).is_empty());
        assert!(build_mine_block_rows(&json!({})).is_empty());
    }

    #[test]
    fn test_tracked_row_fields() {
        let raw = json!({
            "blockTracking": {"blocks": [{
                "persistentId": "PB-9",
                "areaM2": "2500",
                "avgConfidence": 0.5,
                "centroid": [85.1, 23.7],
                "bounds": [85.0, 23.6, "85.2", 23.8],
                "sequence": 4
            }]}
        });
        let rows = build_mine_block_rows(&raw);
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.id, "PB-9");
        assert_eq!(row.label, "Block 1");
        assert_eq!(row.area_ha, 0.25);
        assert_eq!(row.confidence_pct, Some(50.0));
        assert_eq!(row.source, BlockSource::Tile);
        assert_eq!(row.block_index, Some(4.0));
        assert_eq!(row.centroid_lat, Some(23.7));
        assert_eq!(row.centroid_lon, Some(85.1));
        assert_eq!(row.bounds, Some([85.0, 23.6, 85.2, 23.8]));
    }

    #[test]
    fn test_colliding_rows_merge() {
        let raw = json!({
            "blockTracking": {"blocks": [
                {"blockId": "X", "confidence": 0.5, "centroid": [1, 2]},
                {"blockId": "X", "areaHa": 0.75, "isMerged": true}
            ]}
        });
        let rows = build_mine_block_rows(&raw);
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.area_ha, 0.75);
        assert_eq!(row.confidence_pct, Some(50.0));
        assert_eq!(row.centroid_lat, Some(2.0));
        assert!(row.is_merged);
    }

    #[test]
    fn test_tile_row_labels() {
        let raw = json!({
            "tiles": [
                {"tile_index": 3, "mine_blocks": [{"area_m2": 100}]},
                {"mine_blocks": [{"properties": {"name": "North pit", "area_ha": 1}}]},
                {"tile_id": "t-9", "mine_blocks": []}
            ]
        });
        let rows = build_mine_block_rows(&raw);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].label, "North pit");
        assert_eq!(rows[0].id, "tile-Tile 2-block-1");
        assert_eq!(rows[1].label, "tile_3 · Block 1");
        assert_eq!(rows[1].tile_id.as_deref(), Some("tile_3"));
    }

    #[test]
    fn test_ordering() {
        let raw = json!({
            "mergedBlocks": {"features": [
                {"properties": {"id": "m1", "area_ha": 0.1}},
                {"properties": {"id": "m2", "area_ha": 0.1, "block_index": 2}}
            ]},
            "tiles": [{"tile_id": "t", "mine_blocks": [
                {"block_id": "small", "area_ha": 0.2},
                {"block_id": "large", "area_ha": 0.9},
                {"block_id": "first", "area_ha": 0.01, "index": 1}
            ]}]
        });
        let ids: Vec<String> = build_mine_block_rows(&raw).into_iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec!["tile-first", "merged-m2", "merged-m1", "tile-large", "tile-small"]
        );
    }

    #[test]
    fn test_fractional_index_is_kept() {
        let raw = json!({
            "tiles": [{"tile_id": "t", "mine_blocks": [
                {"block_id": "c", "area_ha": 0.1, "index": 2},
                {"block_id": "b", "area_ha": 0.1, "index": 1.5},
                {"block_id": "a", "area_ha": 0.1, "index": 1}
            ]}]
        });
        let rows = build_mine_block_rows(&raw);

        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["tile-a", "tile-b", "tile-c"]);
        assert_eq!(rows[1].block_index, Some(1.5));
    }
}
