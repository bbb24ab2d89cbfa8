//! Poll loop: fetch status until the job completes, fails or is cancelled

use chrono::Utc;
use minewatch_core::{AnalysisSnapshot, AnalysisStatus};
use minewatch_metrics::derive_tile_area_metrics;
use serde_json::Value;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::PollConfig;
use crate::error::PollError;
use crate::source::StatusSource;
use crate::status::{decide, PollDecision, StatusPayload};

/// How a poll run ended; every variant hands the snapshot back to the caller.
#[derive(Debug)]
pub enum PollOutcome {
    Completed { snapshot: AnalysisSnapshot, payload: Value },
    Failed { snapshot: AnalysisSnapshot, reason: String },
    Cancelled { snapshot: AnalysisSnapshot },
    /// Transport or parse error; the snapshot keeps its last known status
    Errored { snapshot: AnalysisSnapshot, error: PollError },
}

impl PollOutcome {
    pub fn snapshot(&self) -> &AnalysisSnapshot {
        match self {
            PollOutcome::Completed { snapshot, .. }
            | PollOutcome::Failed { snapshot, .. }
            | PollOutcome::Cancelled { snapshot }
            | PollOutcome::Errored { snapshot, .. } => snapshot,
        }
    }

    pub fn into_snapshot(self) -> AnalysisSnapshot {
        match self {
            PollOutcome::Completed { snapshot, .. }
            | PollOutcome::Failed { snapshot, .. }
            | PollOutcome::Cancelled { snapshot }
            | PollOutcome::Errored { snapshot, .. } => snapshot,
        }
    }

    pub fn error(&self) -> Option<&PollError> {
        match self {
            PollOutcome::Errored { error, .. } => Some(error),
            _ => None,
        }
    }
}

pub struct Poller<S> {
    source: S,
    config: PollConfig,
}

impl<S: StatusSource> Poller<S> {
    pub fn new(source: S, config: PollConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    fn cancelled(snapshot: AnalysisSnapshot) -> PollOutcome {
        tracing::info!(analysis_id = %snapshot.analysis_id, "Polling cancelled");
        PollOutcome::Cancelled {
            snapshot: snapshot.with_status(AnalysisStatus::Cancelled, None, Utc::now()),
        }
    }

    /// Poll the status of `snapshot.analysis_id` until it settles.
    ///
    /// The first request goes out after `initial_delay`; later ones follow
    /// the `interval` schedule counted from the call. A transport or parse
    /// error ends polling with [`PollOutcome::Errored`].
    pub async fn run(&self, mut snapshot: AnalysisSnapshot, cancel: CancellationToken) -> PollOutcome {
        let started = Instant::now();
        let analysis_id = snapshot.analysis_id.clone();

        let mut ticker = interval_at(started + self.config.interval, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::select! {
            _ = cancel.cancelled() => return Self::cancelled(snapshot),
            _ = tokio::time::sleep(self.config.initial_delay) => {}
        }

        loop {
            let raw = tokio::select! {
                _ = cancel.cancelled() => return Self::cancelled(snapshot),
                fetched = self.source.fetch(&analysis_id) => match fetched {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::warn!(analysis_id = %analysis_id, error = %e, "Status request failed");
                        return PollOutcome::Errored { snapshot, error: e };
                    }
                },
            };

            let payload = match StatusPayload::from_value(raw.clone()) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(analysis_id = %analysis_id, error = %e, "Unreadable status response");
                    return PollOutcome::Errored { snapshot, error: e };
                }
            };
            snapshot = snapshot.with_progress(payload.progress, payload.message.clone());

            if !payload.tiles.is_empty() {
                let live = derive_tile_area_metrics(&payload.tiles);
                tracing::debug!(
                    analysis_id = %analysis_id,
                    tiles = payload.tiles.len(),
                    tile_area_m2 = live.total_tile_area_m2,
                    mining_area_m2 = live.total_mining_area_m2,
                    coverage_pct = ?live.coverage_pct,
                    "Live tile metrics"
                );
            }

            match decide(&payload) {
                PollDecision::Completed => {
                    tracing::info!(analysis_id = %analysis_id, "Analysis completed");
                    let snapshot =
                        snapshot.with_status(AnalysisStatus::Completed, Some(raw.clone()), Utc::now());
                    return PollOutcome::Completed { snapshot, payload: raw };
                }
                PollDecision::Failed(reason) => {
                    tracing::warn!(analysis_id = %analysis_id, reason = %reason, "Analysis failed");
                    let snapshot = snapshot.with_status(AnalysisStatus::Failed, None, Utc::now());
                    return PollOutcome::Failed { snapshot, reason };
                }
                PollDecision::Continue => {
                    tracing::debug!(
                        analysis_id = %analysis_id,
                        progress = payload.progress,
                        step = payload.current_step.as_deref().unwrap_or("-"),
                        "Analysis still running"
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return Self::cancelled(snapshot),
                _ = ticker.tick() => {}
            }
        }
    }
}
