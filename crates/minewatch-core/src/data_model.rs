//! Data Model: canonical analysis record
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::coerce::format_timestamp;
use crate::{M2_PER_HECTARE, M2_PER_KM2};

/// Lifecycle state of a remote analysis job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl AnalysisStatus {
    /// Case-insensitive parse of a backend status string.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Total detected mining area in three consistent units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningArea {
    pub m2: f64,
    pub hectares: f64,
    pub km2: f64,
    /// Any other keys the producer attached to its area object
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MiningArea {
    pub fn from_m2(m2: f64) -> Self {
        Self {
            m2,
            hectares: m2 / M2_PER_HECTARE,
            km2: m2 / M2_PER_KM2,
            extra: Map::new(),
        }
    }
}

impl Default for MiningArea {
    fn default() -> Self {
        Self::from_m2(0.0)
    }
}

/// One analysis result with every field resolved to a single convention.
///
/// Serializes to camelCase JSON. Keys of the source payload that have no
/// canonical counterpart travel in `passthrough` and are flattened next to
/// the canonical fields; the normalizer guarantees the two never collide.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalAnalysis {
    #[serde(flatten)]
    pub passthrough: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AnalysisStatus>,
    pub summary: Map<String, Value>,
    pub tiles: Vec<Value>,
    pub detections: Vec<Value>,
    pub total_tiles: u64,
    pub tiles_processed: u64,
    pub tiles_with_mining: u64,
    pub detection_count: u64,
    pub total_mining_area: MiningArea,
    pub merged_blocks: Option<Value>,
    pub block_tracking: Option<Value>,
    pub statistics: Map<String, Value>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<u64>,
}

impl CanonicalAnalysis {
    /// JSON keys owned by the canonical record.
    pub const CANONICAL_KEYS: [&'static str; 17] = [
        "status",
        "summary",
        "tiles",
        "detections",
        "totalTiles",
        "tilesProcessed",
        "tilesWithMining",
        "detectionCount",
        "totalMiningArea",
        "mergedBlocks",
        "blockTracking",
        "statistics",
        "startTime",
        "endTime",
        "createdAt",
        "completedAt",
        "durationSeconds",
    ];

    /// The record as a JSON value, as downstream consumers read it.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn serialize_timestamp<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(ts) => serializer.serialize_str(&format_timestamp(ts)),
        None => serializer.serialize_none(),
    }
}
