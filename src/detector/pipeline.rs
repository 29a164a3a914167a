//! Detection pipeline driving target assignment, losses and inference.
//!
//! The [`ActionDetector`] exposes the core's two operations over head
//! outputs supplied by the external backbone/neck/head collaborators:
//!
//! - **Training**: assign per-position targets for a batch and reduce the
//!   batch to scalar losses, threading the EMA loss normalizer through
//!   explicitly.
//! - **Inference**: decode one video's pyramid outputs into scored
//!   candidates, suppress them and convert to second-based timestamps.
//!
//! Typical inference usage:
//! ```no_run
//! use action_detector::{ActionDetector, DetectorParams};
//! # fn example(meta: &action_detector::VideoMeta,
//! #            levels: &[action_detector::LevelOutput]) {
//! let mut detector = ActionDetector::new(DetectorParams::default()).unwrap();
//! let report = detector.process_with_diagnostics(meta, levels);
//! println!("{} detections", report.result.len());
//! # }
//! ```

use std::time::Instant;

use log::debug;

use super::params::{DetectorParams, ParamError};
use super::postprocess::to_seconds;
use crate::assign::{assign_batch, AssignConfig, AssignedTargets};
use crate::decode::{DecodeMode, OffsetDecoder};
use crate::diagnostics::{DetectionReport, LevelCandidates, PipelineTrace};
use crate::loss::{LossComputer, LossConfig, LossNormalizer, Losses};
use crate::nms::batched_nms;
use crate::points::{Point, PointGenerator};
use crate::types::{Candidate, DetectionResult, LevelOutput, Segment, TrainSample, VideoMeta};

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Single-stage temporal action detector core.
pub struct ActionDetector {
    params: DetectorParams,
    points: PointGenerator,
    decoder: OffsetDecoder,
    loss: LossComputer,
}

impl ActionDetector {
    /// Build the detector, resolving the decoding strategy once and failing
    /// on any inconsistent configuration.
    pub fn new(params: DetectorParams) -> Result<Self, ParamError> {
        params.validate()?;
        let points = PointGenerator::new(&params.strides, &params.regression_ranges)?;
        let mode = if params.trident.enabled {
            DecodeMode::Trident {
                num_bins: params.trident.num_bins,
            }
        } else {
            DecodeMode::Direct
        };
        let decoder = OffsetDecoder::new(mode, params.num_classes, params.multi_label);
        let loss = LossComputer::new(
            LossConfig {
                num_classes: params.num_classes,
                multi_label: params.multi_label,
                label_smoothing: params.train.label_smoothing,
                loss_weight: params.train.loss_weight,
                iou_weight_power: params.trident.iou_weight_power,
            },
            decoder,
        );
        Ok(Self {
            params,
            points,
            decoder,
            loss,
        })
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Fresh normalizer state seeded from the configuration. The caller owns
    /// it across training steps.
    pub fn initial_normalizer(&self) -> LossNormalizer {
        LossNormalizer::new(self.params.train.init_loss_norm)
    }

    /// Assign classification/regression targets for every sample of a batch
    /// sharing the given per-level (padded) lengths.
    pub fn assign_targets(
        &mut self,
        level_lens: &[usize],
        samples: &[TrainSample],
    ) -> Vec<AssignedTargets> {
        let per_level = self.points.generate(level_lens);
        let flat: Vec<Point> = per_level.iter().flatten().copied().collect();
        let cfg = AssignConfig {
            num_classes: self.params.num_classes,
            multi_label: self.params.multi_label,
            center_sampling: self.params.center_sampling,
        };
        assign_batch(&flat, samples, &cfg)
    }

    /// Reduce precomputed targets and head outputs to scalar losses.
    pub fn losses(
        &self,
        batch: &[Vec<LevelOutput>],
        targets: &[AssignedTargets],
        normalizer: LossNormalizer,
    ) -> (Losses, LossNormalizer) {
        self.loss.compute(batch, targets, normalizer)
    }

    /// One full training forward: targets, then losses. Samples must all be
    /// padded to the same per-level lengths (the batch contract of the
    /// upstream collaborators).
    pub fn train_step(
        &mut self,
        batch: &[Vec<LevelOutput>],
        samples: &[TrainSample],
        normalizer: LossNormalizer,
    ) -> (Losses, LossNormalizer) {
        assert!(!batch.is_empty(), "training batch must not be empty");
        let lens: Vec<usize> = batch[0].iter().map(LevelOutput::len).collect();
        for levels in batch {
            let these: Vec<usize> = levels.iter().map(LevelOutput::len).collect();
            assert_eq!(
                these, lens,
                "all samples of a batch must share per-level lengths"
            );
            for level in levels {
                self.check_level(level);
            }
        }
        let targets = self.assign_targets(&lens, samples);
        self.loss.compute(batch, &targets, normalizer)
    }

    /// Run inference on a single video, returning only the result.
    pub fn process(&mut self, meta: &VideoMeta, levels: &[LevelOutput]) -> DetectionResult {
        self.process_with_diagnostics(meta, levels).result
    }

    /// Run inference on a single video and keep the per-stage trace.
    pub fn process_with_diagnostics(
        &mut self,
        meta: &VideoMeta,
        levels: &[LevelOutput],
    ) -> DetectionReport {
        let total_start = Instant::now();
        let lens: Vec<usize> = levels.iter().map(LevelOutput::len).collect();
        debug!(
            "ActionDetector::process video={} levels={:?}",
            meta.video_id, lens
        );
        let per_level_points = self.points.generate(&lens);

        let mut trace = PipelineTrace {
            num_levels: levels.len(),
            num_points: lens.iter().sum(),
            ..PipelineTrace::default()
        };

        let decode_start = Instant::now();
        let mut candidates: Vec<Candidate> = Vec::new();
        for (i, (level, points)) in levels.iter().zip(per_level_points.iter()).enumerate() {
            self.check_level(level);
            let level_cands = self.decode_level(level, points);
            trace.levels.push(LevelCandidates {
                level: i,
                length: level.len(),
                valid: level.mask.iter().filter(|&&m| m).count(),
                candidates: level_cands.len(),
            });
            candidates.extend(level_cands);
        }
        trace
            .timing
            .push("decode", decode_start.elapsed().as_secs_f64() * 1000.0);
        trace.pre_nms = candidates.len();

        let nms_start = Instant::now();
        let kept = batched_nms(candidates, &self.params.nms);
        trace
            .timing
            .push("nms", nms_start.elapsed().as_secs_f64() * 1000.0);
        trace.post_nms = kept.len();

        let result = to_seconds(&kept, meta);
        trace.timing.total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "ActionDetector::process video={} pre_nms={} post_nms={} total_ms={:.3}",
            meta.video_id, trace.pre_nms, trace.post_nms, trace.timing.total_ms
        );

        DetectionReport { result, trace }
    }

    /// Decode one pyramid level of one video into candidate segments.
    fn decode_level(&self, level: &LevelOutput, points: &[Point]) -> Vec<Candidate> {
        let c_num = self.params.num_classes;
        let test = &self.params.test;

        // flattened (position x class) scores above the floor
        let mut scored: Vec<(f32, usize)> = Vec::new();
        for (t, &valid) in level.mask.iter().enumerate() {
            if !valid {
                continue;
            }
            let logits = level.cls_logits.row(t);
            for c in 0..c_num {
                let score = sigmoid(logits[c]);
                if score > test.pre_nms_thresh {
                    scored.push((score, t * c_num + c));
                }
            }
        }

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(test.pre_nms_topk);

        let mut candidates = Vec::with_capacity(scored.len());
        for (score, flat_idx) in scored {
            let t = flat_idx / c_num;
            let c = flat_idx % c_num;
            let (off_left, off_right) = self.decoder.decode_at(level, t, c);
            let pt = points[t];
            let left = pt.position - off_left * pt.stride;
            let right = pt.position + off_right * pt.stride;
            if right - left > test.duration_thresh {
                candidates.push(Candidate {
                    segment: Segment::new(left, right),
                    score,
                    label: c,
                });
            }
        }
        candidates
    }

    /// Fatal shape checks on collaborator output.
    fn check_level(&self, level: &LevelOutput) {
        let t_len = level.len();
        let c_num = self.params.num_classes;
        assert_eq!(
            level.cls_logits.cols, c_num,
            "classification logits must be [T x {c_num}]"
        );
        assert_eq!(
            level.mask.len(),
            t_len,
            "valid mask must have one entry per position (expected {t_len})"
        );
        assert_eq!(
            level.reg_outputs.rows, t_len,
            "regression outputs must cover all {t_len} positions"
        );
        if matches!(self.decoder.mode(), DecodeMode::Trident { .. }) {
            for (name, logits) in [("start", &level.start_logits), ("end", &level.end_logits)] {
                let logits = logits
                    .as_ref()
                    .unwrap_or_else(|| panic!("Trident mode requires [T x C] {name} logits"));
                assert_eq!(
                    (logits.rows, logits.cols),
                    (t_len, c_num),
                    "{name} logits must be [T x C] = [{t_len} x {c_num}]"
                );
            }
        }
    }
}
