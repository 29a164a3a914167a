#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod detector;
pub mod diagnostics;
pub mod nms;
pub mod types;

// “Expert” modules – still public, but considered unstable internals.
// (You can tighten or feature-gate these later.)
pub mod assign;
pub mod decode;
pub mod loss;
pub mod points;
pub mod seq;

// --- High-level re-exports -------------------------------------------------

// Main entry points: detector + results.
pub use crate::detector::{ActionDetector, DetectorParams, ParamError};
pub use crate::types::{Candidate, DetectionResult, LevelOutput, Segment, TrainSample, VideoMeta};

// High-level diagnostics returned by the detector.
pub use crate::diagnostics::{DetectionReport, PipelineTrace};

// Training-state helpers that callers thread through steps themselves.
pub use crate::loss::{LossNormalizer, Losses};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use action_detector::prelude::*;
///
/// # fn main() {
/// # let (meta, levels): (VideoMeta, Vec<LevelOutput>) = unimplemented!();
/// let mut det = ActionDetector::new(DetectorParams {
///     num_classes: 20,
///     ..Default::default()
/// })
/// .unwrap();
///
/// let report = det.process_with_diagnostics(&meta, &levels);
/// println!(
///     "detections={} total_ms={:.3}",
///     report.result.len(),
///     report.trace.timing.total_ms
/// );
/// # }
/// ```
pub mod prelude {
    pub use crate::seq::SeqF32;
    pub use crate::{
        ActionDetector, DetectionResult, DetectorParams, LevelOutput, LossNormalizer, Segment,
        TrainSample, VideoMeta,
    };
}
