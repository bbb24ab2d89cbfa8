//! Timestamp and duration resolution.
//!
//! The detection backend renamed its timing fields several times. Each
//! canonical value is looked up through an ordered list of field paths; the
//! first value that coerces wins.

use chrono::{DateTime, Utc};
use minewatch_core::coerce::{coerce_duration_seconds, coerce_timestamp, value_at_path};
use serde_json::{Map, Value};

pub const CREATED_PATHS: &[&str] = &["createdAt", "created_at"];

pub const COMPLETED_PATHS: &[&str] = &["completedAt", "completed_at", "finishedAt", "finished_at"];

pub const START_PATHS: &[&str] = &[
    "startTime",
    "start_time",
    "startedAt",
    "started_at",
    "analysisStart",
    "analysis_start",
    "analysisStartedAt",
    "analysis_started_at",
    "timeline.start",
    "timeline.startedAt",
    "timeline.started_at",
    "timing.startTime",
    "timing.start_time",
    "timing.startedAt",
    "timing.started_at",
    "runtime.start",
    "runtime.startedAt",
];

pub const END_PATHS: &[&str] = &[
    "endTime",
    "end_time",
    "completedAt",
    "completed_at",
    "finishedAt",
    "finished_at",
    "analysisCompletedAt",
    "analysis_completed_at",
    "timeline.end",
    "timeline.completedAt",
    "timeline.completed_at",
    "timing.endTime",
    "timing.end_time",
    "timing.completedAt",
    "timing.completed_at",
    "runtime.end",
];

const SECONDS: f64 = 1.0;
const MILLIS: f64 = 1000.0;

const PRIMARY_DURATION_FIELDS: &[(&str, f64)] = &[
    ("durationSeconds", SECONDS),
    ("duration", SECONDS),
    ("runtimeSeconds", SECONDS),
    ("processingTimeSeconds", SECONDS),
    ("runtimeMs", MILLIS),
    ("runtime_ms", MILLIS),
    ("processingTimeMs", MILLIS),
    ("processing_time_ms", MILLIS),
    ("durationMs", MILLIS),
    ("duration_ms", MILLIS),
];

const TOP_LEVEL_DURATION_FIELDS: &[(&str, f64)] = &[
    ("durationSeconds", SECONDS),
    ("duration", SECONDS),
    ("runtimeSeconds", SECONDS),
    ("processingTimeSeconds", SECONDS),
    ("runtimeMs", MILLIS),
    ("runtime_ms", MILLIS),
    ("processingTimeMs", MILLIS),
    ("processing_time_ms", MILLIS),
];

const SUMMARY_DURATION_FIELDS: &[(&str, f64)] = &[
    ("durationSeconds", SECONDS),
    ("duration_seconds", SECONDS),
    ("runtimeSeconds", SECONDS),
    ("runtime_seconds", SECONDS),
    ("runtimeMs", MILLIS),
    ("runtime_ms", MILLIS),
];

const STATISTICS_DURATION_FIELDS: &[(&str, f64)] = &[
    ("durationSeconds", SECONDS),
    ("duration_seconds", SECONDS),
    ("runtimeSeconds", SECONDS),
    ("runtime_seconds", SECONDS),
    ("runtimeMs", MILLIS),
    ("runtime_ms", MILLIS),
    ("processingTimeSeconds", SECONDS),
    ("processing_time_seconds", SECONDS),
    ("processingTimeMs", MILLIS),
    ("processing_time_ms", MILLIS),
];

/// Scan `paths` in priority order across `sources`; every source is tried
/// for a path before moving on to the next path.
pub fn find_timestamp(sources: &[&Value], paths: &[&str]) -> Option<DateTime<Utc>> {
    paths.iter().find_map(|path| {
        sources
            .iter()
            .filter_map(|source| value_at_path(source, path))
            .find_map(coerce_timestamp)
    })
}

fn first_duration(source: Option<&Map<String, Value>>, fields: &[(&str, f64)]) -> Option<f64> {
    let source = source?;
    fields
        .iter()
        .find_map(|(key, divisor)| source.get(*key).and_then(|v| coerce_duration_seconds(v, *divisor)))
}

/// Explicit duration in seconds, if any source reports one.
pub fn find_duration(
    primary: &Value,
    top: &Value,
    summary: &Map<String, Value>,
    statistics: &Map<String, Value>,
) -> Option<f64> {
    first_duration(primary.as_object(), PRIMARY_DURATION_FIELDS)
        .or_else(|| first_duration(top.as_object(), TOP_LEVEL_DURATION_FIELDS))
        .or_else(|| first_duration(Some(summary), SUMMARY_DURATION_FIELDS))
        .or_else(|| first_duration(Some(statistics), STATISTICS_DURATION_FIELDS))
}

/// Seconds from `start` to `end`, when the interval is not reversed.
pub fn elapsed_seconds(start: &DateTime<Utc>, end: &DateTime<Utc>) -> Option<f64> {
    let seconds = (*end - *start).num_milliseconds() as f64 / 1000.0;
    (seconds >= 0.0).then_some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minewatch_core::coerce::format_timestamp;
    use serde_json::json;

    #[test]
    fn test_path_priority_beats_source_priority() {
        let primary = json!({"started_at": "2024-01-01T00:00:10Z"});
        let top = json!({"startTime": "2024-01-01T00:00:20Z"});

        let found = find_timestamp(&[&primary, &top], START_PATHS).unwrap();
        assert_eq!(format_timestamp(&found), "2024-01-01T00:00:20.000Z");
    }

    #[test]
    fn test_nested_paths_and_invalid_values() {
        let primary = json!({"startTime": "not a date", "timing": {"start_time": 1_704_067_200}});
        let found = find_timestamp(&[&primary], START_PATHS).unwrap();
        assert_eq!(format_timestamp(&found), "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_duration_priority() {
        let primary = json!({"runtimeMs": 4500, "processingTimeSeconds": 12});
        let top = json!({"durationSeconds": 99});
        let empty = Map::new();

        assert_eq!(find_duration(&primary, &top, &empty, &empty), Some(12.0));
    }

    #[test]
    fn test_duration_from_statistics_millis() {
        let mut statistics = Map::new();
        statistics.insert("processing_time_ms".to_string(), json!("61500"));

        let found = find_duration(&json!({}), &json!({}), &Map::new(), &statistics);
        assert_eq!(found, Some(61.5));
    }

    #[test]
    fn test_elapsed_seconds() {
        let start = DateTime::from_timestamp(100, 0).unwrap();
        let end = DateTime::from_timestamp(400, 0).unwrap();
        assert_eq!(elapsed_seconds(&start, &end), Some(300.0));
        assert_eq!(elapsed_seconds(&end, &start), None);
    }
}
