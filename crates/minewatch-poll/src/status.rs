//! Status endpoint payload and the poll decision taken on it

use minewatch_core::coerce::{id_string, parse_numeric};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::PollError;

/// One response of the analysis status endpoint.
///
/// Every field is optional on the wire; numeric fields accept numeric
/// strings and unreadable values fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    #[serde(default, deserialize_with = "lenient_text_or_empty")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_progress")]
    pub progress: f64,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub total_tiles: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub tiles_fetched: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub area_km2: Option<f64>,
    #[serde(default, deserialize_with = "lenient_tiles")]
    pub tiles: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn text_of(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(id_string(&other)),
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(text_of(Value::deserialize(d)?))
}

fn lenient_text_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(text_of(Value::deserialize(d)?).unwrap_or_default())
}

fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(parse_numeric(&Value::deserialize(d)?))
}

fn lenient_progress<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(parse_numeric(&Value::deserialize(d)?).unwrap_or(0.0))
}

fn lenient_tiles<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Value>, D::Error> {
    match Value::deserialize(d)? {
        Value::Array(tiles) => Ok(tiles),
        _ => Ok(Vec::new()),
    }
}

impl StatusPayload {
    pub fn from_value(raw: Value) -> Result<Self, PollError> {
        if !raw.is_object() {
            return Err(PollError::Parse("status payload is not an object".to_string()));
        }
        Ok(serde_json::from_value(raw)?)
    }
}

/// What to do after one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollDecision {
    Continue,
    Completed,
    Failed(String),
}

pub fn decide(payload: &StatusPayload) -> PollDecision {
    if payload.status.eq_ignore_ascii_case("completed") || payload.progress >= 100.0 {
        return PollDecision::Completed;
    }

    let error = payload.error.as_deref().filter(|e| !e.is_empty());
    if payload.status.eq_ignore_ascii_case("failed") || error.is_some() {
        let reason = error.unwrap_or("Analysis failed");
        return PollDecision::Failed(reason.to_string());
    }

    PollDecision::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_fields() {
        let payload = StatusPayload::from_value(json!({
            "status": "processing",
            "progress": "42.5",
            "current_step": "preprocessing",
            "total_tiles": "16",
            "tiles": {"not": "a list"},
            "aoi_id": "aoi-1"
        }))
        .unwrap();

        assert_eq!(payload.progress, 42.5);
        assert_eq!(payload.total_tiles, Some(16.0));
        assert!(payload.tiles.is_empty());
        assert!(payload.message.is_none());
        assert_eq!(payload.extra["aoi_id"], "aoi-1");
    }

    #[test]
    fn test_missing_fields_default() {
        let payload = StatusPayload::from_value(json!({})).unwrap();
        assert_eq!(payload.status, "");
        assert_eq!(payload.progress, 0.0);
        assert_eq!(decide(&payload), PollDecision::Continue);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(StatusPayload::from_value(json!([1, 2])), Err(PollError::Parse(_))));
    }

    #[test]
    fn test_decide() {
        let completed = StatusPayload { status: "completed".into(), ..Default::default() };
        let full = StatusPayload { status: "processing".into(), progress: 100.0, ..Default::default() };
        let failed = StatusPayload { status: "failed".into(), ..Default::default() };
        let errored = StatusPayload {
            status: "processing".into(),
            error: Some("GEE quota exceeded".into()),
            ..Default::default()
        };
        let blank_error = StatusPayload { error: Some(String::new()), ..Default::default() };

        assert_eq!(decide(&completed), PollDecision::Completed);
        assert_eq!(decide(&full), PollDecision::Completed);
        assert_eq!(decide(&failed), PollDecision::Failed("Analysis failed".into()));
        assert_eq!(decide(&errored), PollDecision::Failed("GEE quota exceeded".into()));
        assert_eq!(decide(&blank_error), PollDecision::Continue);
    }
}
