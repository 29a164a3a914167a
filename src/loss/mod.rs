//! Training losses over concatenated pyramid outputs.
//!
//! Combines a sigmoid focal classification loss with a DIoU regression loss
//! over positive positions, both divided by an EMA-stabilized count of
//! foreground positions. In Trident mode the classification loss of every
//! positive entry is additionally reweighted by the generalized-IoU quality
//! of its decoded boundaries, so high-confidence candidates with poor
//! boundaries stop being rewarded.
//!
//! The normalizer is the only cross-step state in the core. It is passed in
//! and returned explicitly rather than mutated in place, which keeps the
//! computation referentially transparent and the update rule
//! (`0.9·prev + 0.1·max(num_pos, 1)`) trivially testable.

pub mod focal;
pub mod iou;

pub use focal::sigmoid_focal_loss;
pub use iou::{ctr_diou_loss_1d, ctr_giou_1d};

use std::collections::HashMap;

use log::debug;

use crate::assign::AssignedTargets;
use crate::decode::{DecodeMode, OffsetDecoder};
use crate::types::LevelOutput;

/// EMA momentum of the foreground-count normalizer.
pub const NORMALIZER_MOMENTUM: f32 = 0.9;

/// EMA over the number of positive positions per training step. Part of the
/// model state: it persists across steps and is updated exactly once per
/// forward pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LossNormalizer {
    value: f32,
}

impl LossNormalizer {
    pub fn new(init: f32) -> Self {
        Self { value: init }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// One EMA step; the floor of one positive prevents collapse on
    /// background-only batches.
    pub fn updated(&self, num_pos: usize) -> Self {
        Self {
            value: NORMALIZER_MOMENTUM * self.value
                + (1.0 - NORMALIZER_MOMENTUM) * (num_pos.max(1) as f32),
        }
    }
}

/// Scalar losses of one training step.
#[derive(Clone, Copy, Debug)]
pub struct Losses {
    pub cls_loss: f32,
    pub reg_loss: f32,
    pub final_loss: f32,
    /// Positive positions (single-label) or position-class pairs
    /// (multi-label) that entered the step.
    pub num_pos: usize,
}

/// Static knobs of the loss computation.
#[derive(Clone, Copy, Debug)]
pub struct LossConfig {
    pub num_classes: usize,
    pub multi_label: bool,
    /// Label smoothing ε applied as `t' = t(1−ε) + ε/(C+1)`.
    pub label_smoothing: f32,
    /// Fixed classification/regression balance; non-positive selects the
    /// per-step automatic balance `cls / max(reg, 0.01)`.
    pub loss_weight: f32,
    /// Exponent of the gIoU coupling weight in Trident mode.
    pub iou_weight_power: f32,
}

/// Computes classification and regression losses for one batch.
pub struct LossComputer {
    cfg: LossConfig,
    decoder: OffsetDecoder,
}

impl LossComputer {
    pub fn new(cfg: LossConfig, decoder: OffsetDecoder) -> Self {
        Self { cfg, decoder }
    }

    /// Compute losses for a batch of per-level head outputs and their
    /// assigned targets. Returns the losses together with the updated
    /// normalizer; the caller owns persisting the state.
    pub fn compute(
        &self,
        batch: &[Vec<LevelOutput>],
        targets: &[AssignedTargets],
        normalizer: LossNormalizer,
    ) -> (Losses, LossNormalizer) {
        assert_eq!(
            batch.len(),
            targets.len(),
            "loss computation expects one target set per sample ({} outputs vs {} targets)",
            batch.len(),
            targets.len()
        );
        let trident = matches!(self.decoder.mode(), DecodeMode::Trident { .. });
        let c_num = self.cfg.num_classes;

        // Pass 1: positive entries. Decoded/target offset pairs feed the
        // regression loss; in Trident mode each pair also yields the gIoU
        // weight applied to that entry's classification loss.
        let mut num_pos = 0usize;
        let mut reg_pairs: Vec<((f32, f32), (f32, f32))> = Vec::new();
        let mut iou_weights: HashMap<(usize, usize, usize), f32> = HashMap::new();

        for (s, (levels, tgt)) in batch.iter().zip(targets).enumerate() {
            let mut g = 0usize;
            for level in levels {
                for t in 0..level.len() {
                    if level.mask[t] {
                        let row = tgt.cls.row(g);
                        if self.cfg.multi_label {
                            for (c, &v) in row.iter().enumerate() {
                                if v > 0.0 {
                                    num_pos += 1;
                                    self.push_positive(
                                        level, tgt, trident, s, g, t, c, &mut reg_pairs,
                                        &mut iou_weights,
                                    );
                                }
                            }
                        } else if row.iter().any(|&v| v > 0.0) {
                            num_pos += 1;
                            if trident {
                                for (c, &v) in row.iter().enumerate() {
                                    if v > 0.0 {
                                        self.push_positive(
                                            level, tgt, trident, s, g, t, c, &mut reg_pairs,
                                            &mut iou_weights,
                                        );
                                    }
                                }
                            } else {
                                self.push_positive(
                                    level, tgt, trident, s, g, t, 0, &mut reg_pairs,
                                    &mut iou_weights,
                                );
                            }
                        }
                    }
                    g += 1;
                }
            }
            assert_eq!(
                g, tgt.cls.rows,
                "targets cover {} positions but outputs provide {}",
                tgt.cls.rows, g
            );
        }

        let updated = normalizer.updated(num_pos);

        // Pass 2: focal classification loss over every valid entry.
        let eps = self.cfg.label_smoothing;
        let floor = eps / (c_num as f32 + 1.0);
        let mut cls_sum = 0.0f32;
        for (s, (levels, tgt)) in batch.iter().zip(targets).enumerate() {
            let mut g = 0usize;
            for level in levels {
                for t in 0..level.len() {
                    if level.mask[t] {
                        let logits = level.cls_logits.row(t);
                        let row = tgt.cls.row(g);
                        for c in 0..c_num {
                            let smoothed = row[c] * (1.0 - eps) + floor;
                            let mut entry = sigmoid_focal_loss(logits[c], smoothed);
                            if trident && smoothed > floor {
                                entry *= iou_weights[&(s, g, c)];
                            }
                            cls_sum += entry;
                        }
                    }
                    g += 1;
                }
            }
        }
        let cls_loss = cls_sum / updated.value();

        let reg_loss = if num_pos == 0 {
            0.0
        } else {
            reg_pairs
                .iter()
                .map(|&(pred, gt)| ctr_diou_loss_1d(pred, gt))
                .sum::<f32>()
                / updated.value()
        };

        let loss_weight = if self.cfg.loss_weight > 0.0 {
            self.cfg.loss_weight
        } else {
            cls_loss / reg_loss.max(0.01)
        };
        let final_loss = cls_loss + reg_loss * loss_weight;

        debug!(
            "losses: cls={cls_loss:.5} reg={reg_loss:.5} final={final_loss:.5} num_pos={num_pos} normalizer={:.2}",
            updated.value()
        );

        (
            Losses {
                cls_loss,
                reg_loss,
                final_loss,
                num_pos,
            },
            updated,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn push_positive(
        &self,
        level: &LevelOutput,
        tgt: &AssignedTargets,
        trident: bool,
        s: usize,
        g: usize,
        t: usize,
        c: usize,
        reg_pairs: &mut Vec<((f32, f32), (f32, f32))>,
        iou_weights: &mut HashMap<(usize, usize, usize), f32>,
    ) {
        let pred = self.decoder.decode_at(level, t, c);
        let gt = if self.cfg.multi_label {
            (tgt.reg.get(g, 2 * c), tgt.reg.get(g, 2 * c + 1))
        } else {
            (tgt.reg.get(g, 0), tgt.reg.get(g, 1))
        };
        reg_pairs.push((pred, gt));
        if trident {
            // negative gIoU would turn fractional powers into NaN
            let quality = ctr_giou_1d(pred, gt).max(0.0);
            iou_weights.insert((s, g, c), quality.powf(self.cfg.iou_weight_power));
        }
    }
}
