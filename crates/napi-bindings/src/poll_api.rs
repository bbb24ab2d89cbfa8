//! NAPI bindings for status polling decisions

use minewatch_poll::{decide, step_state, PollDecision, StatusPayload, StepState};
use napi::bindgen_prelude::*;

use crate::parse_json;

/// Decision taken on one status response
#[napi(object)]
pub struct PollVerdict {
    /// `continue`, `completed` or `failed`
    pub action: String,
    pub reason: Option<String>,
}

#[napi]
pub fn decide_poll(status_json: String) -> Result<PollVerdict> {
    let raw = parse_json(&status_json)?;
    let payload = StatusPayload::from_value(raw).map_err(|e| Error::from_reason(e.to_string()))?;

    let verdict = match decide(&payload) {
        PollDecision::Continue => PollVerdict { action: "continue".to_string(), reason: None },
        PollDecision::Completed => PollVerdict { action: "completed".to_string(), reason: None },
        PollDecision::Failed(reason) => PollVerdict { action: "failed".to_string(), reason: Some(reason) },
    };
    Ok(verdict)
}

/// `completed`, `active` or `pending` for step `index` given the reported step key
#[napi]
pub fn analysis_step_state(index: u32, current_step: String) -> String {
    match step_state(index as usize, &current_step) {
        StepState::Completed => "completed",
        StepState::Active => "active",
        StepState::Pending => "pending",
    }
    .to_string()
}
