//! API Handlers
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use minewatch_core::{CanonicalAnalysis, MINEWATCH_VERSION};
use minewatch_metrics::{
    build_mine_block_rows, derive_confidence_metrics, derive_tile_area_metrics, extract_summary,
    ConfidenceMetrics, DerivedSummary, MineBlockRow, TileAreaMetrics,
};
use minewatch_normalize::normalize;
use serde_json::{json, Value};

use crate::AppState;

pub async fn normalize_results(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Json<Option<CanonicalAnalysis>> {
    state.metrics.record("normalize");
    Json(normalize(&payload))
}

/// Accepts a bare tile list or an object carrying `tiles`.
pub async fn tile_metrics(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Json<TileAreaMetrics> {
    state.metrics.record("tile_metrics");

    let tiles = match &payload {
        Value::Array(tiles) => tiles.as_slice(),
        other => other
            .get("tiles")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
    };
    Json(derive_tile_area_metrics(tiles))
}

pub async fn confidence_metrics(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Json<ConfidenceMetrics> {
    state.metrics.record("confidence_metrics");
    Json(derive_confidence_metrics(&payload))
}

pub async fn summary(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Json<Option<DerivedSummary>> {
    state.metrics.record("summary");
    Json(extract_summary(&payload))
}

pub async fn mine_blocks(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Json<Vec<MineBlockRow>> {
    state.metrics.record("mine_blocks");
    Json(build_mine_block_rows(&payload))
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok", "version": MINEWATCH_VERSION })))
}

pub async fn metrics_text(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
