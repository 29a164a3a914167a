use serde::Serialize;

use crate::seq::SeqF32;

/// A temporal interval. Units depend on context: feature-grid coordinates
/// inside the pipeline, seconds after postprocessing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub start: f32,
    pub end: f32,
}

impl Segment {
    #[inline]
    pub fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.end - self.start
    }
}

/// A scored detection candidate produced by the inference decoder and
/// reduced by NMS. Lives for a single inference call.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub segment: Segment,
    pub score: f32,
    pub label: usize,
}

/// Video-level metadata carried alongside the features by the dataset
/// collaborator. Needed only for the final grid-to-seconds conversion.
#[derive(Clone, Debug)]
pub struct VideoMeta {
    pub video_id: String,
    pub fps: f32,
    /// Video duration in seconds.
    pub duration: f32,
    /// Temporal stride of the feature grid, in frames.
    pub feat_stride: f32,
    /// Number of frames aggregated into one feature step.
    pub feat_num_frames: f32,
}

/// Ground truth for one training sample, in feature-grid coordinates.
/// Immutable after label loading.
#[derive(Clone, Debug, Default)]
pub struct TrainSample {
    /// `[N]` action intervals.
    pub segments: Vec<Segment>,
    /// `[N]` class indices aligned with `segments`.
    pub labels: Vec<usize>,
}

/// Head outputs for one pyramid level of one sample. This is the in-process
/// contract with the backbone/neck/head collaborators; the core consumes
/// nothing else.
#[derive(Clone, Debug)]
pub struct LevelOutput {
    /// `[T × C]` classification logits.
    pub cls_logits: SeqF32,
    /// `[T × D]` regression outputs; `D` depends on the decoding mode, see
    /// [`crate::decode::OffsetDecoder`].
    pub reg_outputs: SeqF32,
    /// `[T × C]` start-boundary logits (Trident mode only).
    pub start_logits: Option<SeqF32>,
    /// `[T × C]` end-boundary logits (Trident mode only).
    pub end_logits: Option<SeqF32>,
    /// `[T]` valid-length mask; padding positions are false.
    pub mask: Vec<bool>,
}

impl LevelOutput {
    /// Temporal length of this level.
    #[inline]
    pub fn len(&self) -> usize {
        self.cls_logits.rows
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cls_logits.rows == 0
    }
}

/// Final per-video detections with timestamps in seconds.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub video_id: String,
    /// `[K]` action intervals in seconds, clamped to `[0, duration]`.
    pub segments: Vec<Segment>,
    /// `[K]` confidence scores.
    pub scores: Vec<f32>,
    /// `[K]` class indices.
    pub labels: Vec<usize>,
}

impl DetectionResult {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
