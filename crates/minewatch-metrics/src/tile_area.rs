//! Tile area and mining coverage aggregation

use minewatch_core::coerce::{id_string, parse_numeric, pick, properties_of, to_number};
use minewatch_core::{AREA_PER_PIXEL_M2, M2_PER_HECTARE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

const MOSAIC: &str = "mosaic";

/// Area totals across the tiles of one analysis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileAreaMetrics {
    pub total_tile_area_m2: f64,
    pub total_mining_area_m2: f64,
    /// Mining share of the analysed area, 0-100; `None` when no tile has a known area
    pub coverage_pct: Option<f64>,
}

/// Area of one mine block in m², from m², hectares or mask pixels.
pub fn block_area_m2(block: &Value) -> f64 {
    let props = properties_of(block);

    if let Some(m2) = pick(props, &["area_m2", "areaM2"]).and_then(parse_numeric) {
        return m2;
    }
    if let Some(ha) = pick(props, &["area_ha", "areaHa"]).and_then(parse_numeric) {
        return ha * M2_PER_HECTARE;
    }
    if let Some(px) = pick(props, &["area_px", "areaPx"]).and_then(parse_numeric) {
        return px * AREA_PER_PIXEL_M2;
    }
    0.0
}

/// A synthetic tile stitched from the others.
pub fn is_mosaic_tile(tile: &Value) -> bool {
    let id = pick(tile, &["tile_id", "tileId"]).map(id_string).unwrap_or_default();
    let status = pick(tile, &["status"]).map(id_string).unwrap_or_default();
    id.eq_ignore_ascii_case(MOSAIC) || status.eq_ignore_ascii_case(MOSAIC)
}

/// Ground area of a tile: explicit area, else mask shape times pixel area, else 0.
pub fn tile_area_m2(tile: &Value) -> f64 {
    if let Some(area) = pick(tile, &["total_area_m2", "totalAreaM2"]).and_then(parse_numeric) {
        if area > 0.0 {
            return area;
        }
    }

    if let Some(shape) = tile.get("mask_shape").and_then(Value::as_array) {
        if shape.len() >= 2 {
            if let (Some(height), Some(width)) = (to_number(&shape[0]), to_number(&shape[1])) {
                if height > 0.0 && width > 0.0 {
                    return height * width * AREA_PER_PIXEL_M2;
                }
            }
        }
    }

    0.0
}

fn tile_blocks(tile: &Value) -> &[Value] {
    tile.get("mine_blocks")
        .and_then(Value::as_array)
        .or_else(|| tile.get("mineBlocks").and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Mining area of a tile.
///
/// Block areas are summed once per block id and capped at the tile area,
/// since overlapping block reports can exceed it. Tiles without blocks fall
/// back to their mining percentage.
pub fn tile_mining_area_m2(tile: &Value, tile_area: f64) -> f64 {
    let blocks = tile_blocks(tile);

    if !blocks.is_empty() {
        let mut seen = HashSet::new();
        let mut total = 0.0;

        for (index, block) in blocks.iter().enumerate() {
            let area = block_area_m2(block);
            if !area.is_finite() || area <= 0.0 {
                continue;
            }

            let props = properties_of(block);
            let key = match pick(props, &["block_id", "id", "tile_block_id"]) {
                Some(id) => format!("id:{}", id_string(id)),
                None => format!("idx:{}", index),
            };
            if seen.insert(key) {
                total += area;
            }
        }

        return if tile_area > 0.0 { total.min(tile_area) } else { total };
    }

    let percentage = pick(tile, &["mining_percentage", "miningPercentage"]).and_then(parse_numeric);
    if let Some(raw) = percentage {
        if tile_area > 0.0 {
            let fraction = if raw > 1.0 { raw / 100.0 } else { raw };
            if fraction >= 0.0 {
                return tile_area * fraction.min(1.0);
            }
        }
    }

    0.0
}

/// Aggregate tile and mining area across `tiles`.
///
/// Mosaic tiles are left out whenever real tiles are present, as they
/// repeat area already counted per tile.
pub fn derive_tile_area_metrics(tiles: &[Value]) -> TileAreaMetrics {
    if tiles.is_empty() {
        return TileAreaMetrics::default();
    }

    let non_mosaic: Vec<&Value> = tiles.iter().filter(|tile| !is_mosaic_tile(tile)).collect();
    let candidates: Vec<&Value> = if non_mosaic.is_empty() {
        tiles.iter().collect()
    } else {
        if non_mosaic.len() < tiles.len() {
            tracing::debug!(
                excluded = tiles.len() - non_mosaic.len(),
                "Excluding mosaic tiles from area totals"
            );
        }
        non_mosaic
    };

    let mut total_tile_area_m2 = 0.0;
    let mut total_mining_area_m2 = 0.0;

    for tile in candidates {
        let tile_area = tile_area_m2(tile);
        if !(tile_area > 0.0) {
            continue;
        }
        total_tile_area_m2 += tile_area;

        let mining_area = tile_mining_area_m2(tile, tile_area);
        if mining_area > 0.0 {
            total_mining_area_m2 += mining_area.min(tile_area);
        }
    }

    let coverage_pct = (total_tile_area_m2 > 0.0)
        .then(|| (total_mining_area_m2 / total_tile_area_m2 * 100.0).min(100.0));

    TileAreaMetrics {
        total_tile_area_m2,
        total_mining_area_m2,
        coverage_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tile(area: f64, mining: f64) -> Value {
        json!({
            "tile_id": format!("t-{}", area),
            "total_area_m2": area,
            "mine_blocks": if mining > 0.0 {
                json!([{"properties": {"block_id": "b", "area_m2": mining}}])
            } else {
                json!([])
            }
        })
    }

    #[test]
    fn test_empty_tiles() {
        let metrics = derive_tile_area_metrics(&[]);
        assert_eq!(metrics.total_tile_area_m2, 0.0);
        assert_eq!(metrics.total_mining_area_m2, 0.0);
        assert!(metrics.coverage_pct.is_none());
    }

    #[test]
    fn test_three_tile_totals() {
        let tiles = vec![tile(100.0, 10.0), tile(200.0, 0.0), tile(300.0, 30.0)];
        let metrics = derive_tile_area_metrics(&tiles);

        assert_eq!(metrics.total_tile_area_m2, 600.0);
        assert_eq!(metrics.total_mining_area_m2, 40.0);
        assert!((metrics.coverage_pct.unwrap() - 6.666_666_666_7).abs() < 1e-6);
    }

    #[test]
    fn test_block_area_units() {
        assert_eq!(block_area_m2(&json!({"properties": {"area_m2": "250"}})), 250.0);
        assert_eq!(block_area_m2(&json!({"areaHa": 0.5})), 5_000.0);
        assert_eq!(block_area_m2(&json!({"area_px": 12})), 1_200.0);
        assert_eq!(block_area_m2(&json!({"area_m2": "n/a", "area_ha": 2})), 20_000.0);
        assert_eq!(block_area_m2(&json!({})), 0.0);
    }

    #[test]
    fn test_tile_area_from_mask_shape() {
        assert_eq!(tile_area_m2(&json!({"mask_shape": [256, "128"]})), 256.0 * 128.0 * 100.0);
        assert_eq!(tile_area_m2(&json!({"total_area_m2": 0, "mask_shape": [2, 3]})), 600.0);
        assert_eq!(tile_area_m2(&json!({"mask_shape": [0, 3]})), 0.0);
        assert_eq!(tile_area_m2(&json!({"mask_shape": [4]})), 0.0);
    }

    #[test]
    fn test_duplicate_blocks_counted_once_and_capped() {
        let tile = json!({
            "total_area_m2": 1000,
            "mine_blocks": [
                {"properties": {"block_id": 1, "area_m2": 700}},
                {"properties": {"block_id": 1, "area_m2": 700}},
                {"properties": {"block_id": 2, "area_m2": 600}},
                {"properties": {"area_m2": -5}}
            ]
        });
        assert_eq!(tile_mining_area_m2(&tile, 1000.0), 1000.0);
        assert_eq!(tile_mining_area_m2(&tile, 0.0), 1300.0);
    }

    #[test]
    fn test_percentage_fallback() {
        let as_percent = json!({"total_area_m2": 2000, "mining_percentage": 25});
        let as_fraction = json!({"total_area_m2": 2000, "miningPercentage": 0.25});
        let negative = json!({"total_area_m2": 2000, "mining_percentage": -0.5});

        assert_eq!(tile_mining_area_m2(&as_percent, 2000.0), 500.0);
        assert_eq!(tile_mining_area_m2(&as_fraction, 2000.0), 500.0);
        assert_eq!(tile_mining_area_m2(&negative, 2000.0), 0.0);
    }

    #[test]
    fn test_mosaic_excluded_only_alongside_real_tiles() {
        let mosaic = json!({"tile_id": "MOSAIC", "total_area_m2": 900, "mining_percentage": 50});
        let real = json!({"tile_id": "t-1", "total_area_m2": 300, "mining_percentage": 10});

        let mixed = derive_tile_area_metrics(&[mosaic.clone(), real]);
        assert_eq!(mixed.total_tile_area_m2, 300.0);

        let only_mosaic = derive_tile_area_metrics(&[mosaic]);
        assert_eq!(only_mosaic.total_tile_area_m2, 900.0);
        assert_eq!(only_mosaic.coverage_pct, Some(50.0));
    }

    #[test]
    fn test_coverage_never_exceeds_hundred() {
        let tiles = vec![
            json!({"total_area_m2": 100, "mining_percentage": 250}),
            json!({"total_area_m2": 100, "mine_blocks": [{"area_m2": 5000}]}),
        ];
        let metrics = derive_tile_area_metrics(&tiles);
        assert!(metrics.coverage_pct.unwrap() <= 100.0);
        assert_eq!(metrics.total_mining_area_m2, 200.0);
    }
}
