//! Structured diagnostics returned by the inference pipeline.
//!
//! [`DetectionReport`] is the main entry point: it bundles the final
//! per-video result with a [`PipelineTrace`] describing what each stage saw
//! and how long it took. Everything serializes to JSON for offline
//! inspection.

use serde::Serialize;

use crate::types::DetectionResult;

/// Timing entry for a single pipeline stage.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

impl StageTiming {
    pub fn new(label: impl Into<String>, elapsed_ms: f64) -> Self {
        Self {
            label: label.into(),
            elapsed_ms,
        }
    }
}

/// Aggregated timing trace for one inference call.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn push(&mut self, label: impl Into<String>, elapsed_ms: f64) {
        self.stages.push(StageTiming::new(label, elapsed_ms));
    }
}

/// Per-level candidate statistics of the inference decoder.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelCandidates {
    pub level: usize,
    /// Temporal length of the level (including padding).
    pub length: usize,
    /// Positions with a true valid mask.
    pub valid: usize,
    /// Candidates surviving threshold, top-k and duration filtering.
    pub candidates: usize,
}

/// Stage-by-stage account of one inference call.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTrace {
    pub num_levels: usize,
    /// Points across all levels (the canonical position index size).
    pub num_points: usize,
    pub levels: Vec<LevelCandidates>,
    /// Candidates entering suppression.
    pub pre_nms: usize,
    /// Detections surviving suppression and filtering.
    pub post_nms: usize,
    pub timing: TimingBreakdown,
}

/// Final result plus the trace that produced it.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub result: DetectionResult,
    pub trace: PipelineTrace,
}
