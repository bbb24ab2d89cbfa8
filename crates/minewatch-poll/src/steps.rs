//! Analysis pipeline steps as reported in `current_step`

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisStep {
    pub key: &'static str,
    pub label: &'static str,
    /// Progress range covered by the step, in percent
    pub progress_range: (u8, u8),
}

pub const ANALYSIS_STEPS: [AnalysisStep; 5] = [
    AnalysisStep { key: "validating", label: "Validating AOI", progress_range: (0, 15) },
    AnalysisStep { key: "preprocessing", label: "Fetching Satellite Tiles", progress_range: (15, 65) },
    AnalysisStep { key: "processing", label: "Loading ML Model", progress_range: (65, 80) },
    AnalysisStep { key: "ml_inference_tiles", label: "Running Inference", progress_range: (80, 95) },
    AnalysisStep { key: "completed", label: "Generating Results", progress_range: (95, 100) },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Completed,
    Active,
    Pending,
}

pub fn current_step_index(current_step: &str) -> Option<usize> {
    ANALYSIS_STEPS.iter().position(|step| step.key == current_step)
}

/// State of step `index` while the job reports `current_step`.
pub fn step_state(index: usize, current_step: &str) -> StepState {
    match current_step_index(current_step) {
        Some(current) if index < current => StepState::Completed,
        Some(current) if index == current => StepState::Active,
        _ => StepState::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_states() {
        assert_eq!(current_step_index("processing"), Some(2));
        assert_eq!(step_state(0, "processing"), StepState::Completed);
        assert_eq!(step_state(2, "processing"), StepState::Active);
        assert_eq!(step_state(4, "processing"), StepState::Pending);
    }

    #[test]
    fn test_unknown_step_leaves_everything_pending() {
        assert_eq!(current_step_index("initialization"), None);
        for index in 0..ANALYSIS_STEPS.len() {
            assert_eq!(step_state(index, "initialization"), StepState::Pending);
        }
    }

    #[test]
    fn test_ranges_are_contiguous() {
        for pair in ANALYSIS_STEPS.windows(2) {
            assert_eq!(pair[0].progress_range.1, pair[1].progress_range.0);
        }
        assert_eq!(ANALYSIS_STEPS[4].progress_range.1, 100);
    }
}
