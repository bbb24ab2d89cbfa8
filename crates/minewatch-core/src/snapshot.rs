//! Analysis Snapshot: caller-owned state of the job being watched
//!
//! Each update returns a new snapshot with a bumped `version`, so holders can
//! tell stale copies apart without sharing mutable state.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data_model::AnalysisStatus;
use crate::error::MinewatchError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSnapshot {
    pub analysis_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aoi_id: Option<String>,
    pub status: AnalysisStatus,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Whole seconds between start and end, once the job is terminal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
    #[serde(default)]
    pub version: u64,
}

impl AnalysisSnapshot {
    pub fn begin(analysis_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            analysis_id: analysis_id.into(),
            aoi_id: None,
            status: AnalysisStatus::Processing,
            start_time: now,
            end_time: None,
            duration: None,
            progress: 0.0,
            message: None,
            results: None,
            version: 0,
        }
    }

    pub fn with_aoi(mut self, aoi_id: impl Into<String>) -> Self {
        self.aoi_id = Some(aoi_id.into());
        self.version += 1;
        self
    }

    /// Record progress; a missing message keeps the previous one.
    pub fn with_progress(mut self, progress: f64, message: Option<String>) -> Self {
        if progress.is_finite() {
            self.progress = progress;
        }
        if let Some(message) = message.filter(|m| !m.is_empty()) {
            self.message = Some(message);
        }
        self.version += 1;
        self
    }

    /// Move to `status`, stamping the end time and elapsed whole seconds.
    pub fn with_status(mut self, status: AnalysisStatus, results: Option<Value>, now: DateTime<Utc>) -> Self {
        self.status = status;
        self.end_time = Some(now);
        self.duration = Some((now - self.start_time).num_milliseconds().div_euclid(1000));
        self.results = results;
        self.version += 1;
        self
    }

    pub fn to_json(&self) -> Result<String, MinewatchError> {
        serde_json::to_string(self).map_err(MinewatchError::from)
    }

    /// Rehydrate a persisted snapshot. Only jobs still processing are worth
    /// resuming; finished or unreadable snapshots yield `None`.
    pub fn restore(json: &str) -> Option<Self> {
        match serde_json::from_str::<Self>(json) {
            Ok(snapshot) if snapshot.status == AnalysisStatus::Processing => Some(snapshot),
            Ok(snapshot) => {
                tracing::debug!(status = %snapshot.status, "Discarding finished analysis snapshot");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to restore analysis snapshot");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_704_067_200, 0).unwrap()
    }

    #[test]
    fn test_progress_bumps_version() {
        let snapshot = AnalysisSnapshot::begin("an-1", start());
        assert_eq!(snapshot.version, 0);

        let snapshot = snapshot.with_progress(40.0, Some("Fetching tiles".to_string()));
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.progress, 40.0);

        let snapshot = snapshot.with_progress(55.0, None);
        assert_eq!(snapshot.version, 2);
        assert_eq!(snapshot.message.as_deref(), Some("Fetching tiles"));
    }

    #[test]
    fn test_with_status_stamps_duration() {
        let end = start() + Duration::milliseconds(95_900);
        let snapshot = AnalysisSnapshot::begin("an-1", start())
            .with_status(AnalysisStatus::Completed, Some(json!({"ok": true})), end);

        assert_eq!(snapshot.status, AnalysisStatus::Completed);
        assert_eq!(snapshot.end_time, Some(end));
        assert_eq!(snapshot.duration, Some(95));
        assert!(snapshot.results.is_some());
    }

    #[test]
    fn test_restore_only_processing() {
        let running = AnalysisSnapshot::begin("an-2", start()).with_aoi("aoi-7");
        let json = running.to_json().unwrap();
        assert_eq!(AnalysisSnapshot::restore(&json), Some(running.clone()));

        let done = running.with_status(AnalysisStatus::Failed, None, start());
        assert_eq!(AnalysisSnapshot::restore(&done.to_json().unwrap()), None);

        assert_eq!(AnalysisSnapshot::restore("{broken"), None);
    }
}
