//! Parameter types configuring the detection core.
//!
//! This module groups knobs for point generation, target assignment, the
//! Trident boundary head, loss balancing and test-time decoding/suppression.
//! Every struct deserializes from the runtime JSON config and carries
//! defaults tuned for feature grids in the few-hundred-positions range.

use serde::Deserialize;
use thiserror::Error;

use crate::nms::NmsParams;

/// Construction-time configuration failures. All fatal; the detector never
/// starts with an inconsistent setup.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("detector requires at least one pyramid level")]
    NoLevels,
    #[error("{levels} pyramid levels but {ranges} regression ranges; the lists must pair up")]
    RangeCountMismatch { levels: usize, ranges: usize },
    #[error("level {level} has non-positive stride {stride}")]
    BadStride { level: usize, stride: f32 },
    #[error("level {level} has malformed regression range [{lo}, {hi}]")]
    BadRange { level: usize, lo: f32, hi: f32 },
    #[error("num_classes must be positive")]
    NoClasses,
    #[error("num_bins must be positive when the Trident head is enabled")]
    NoBins,
    #[error("soft-NMS sigma must be positive, got {sigma}")]
    BadSigma { sigma: f32 },
}

/// Which positions near a ground-truth segment count as inside it during
/// assignment.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum CenterSampling {
    /// Keep positions within `center ± stride × radius`, clipped to the
    /// segment boundaries.
    Radius { radius: f32 },
    /// Plain interval membership.
    None,
}

impl Default for CenterSampling {
    fn default() -> Self {
        Self::Radius { radius: 1.5 }
    }
}

/// Trident boundary-head configuration.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct TridentParams {
    /// Distribution decoding on/off; off falls back to direct regression.
    pub enabled: bool,
    /// Number of discretized distance bins, excluding zero.
    pub num_bins: usize,
    /// Exponent of the gIoU weight coupling boundary quality into the
    /// classification loss.
    pub iou_weight_power: f32,
}

impl Default for TridentParams {
    fn default() -> Self {
        Self {
            enabled: true,
            num_bins: 16,
            iou_weight_power: 0.2,
        }
    }
}

/// Training-time loss knobs.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct TrainParams {
    /// Label smoothing ε.
    pub label_smoothing: f32,
    /// Fixed regression-loss weight; non-positive switches to the per-step
    /// automatic balance.
    pub loss_weight: f32,
    /// Initial value of the EMA loss normalizer.
    pub init_loss_norm: f32,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            label_smoothing: 0.0,
            loss_weight: 1.0,
            init_loss_norm: 100.0,
        }
    }
}

/// Test-time candidate decoding knobs, applied per pyramid level before NMS.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct TestParams {
    /// Score floor on flattened (position × class) entries.
    pub pre_nms_thresh: f32,
    /// Keep at most this many top-scoring entries per level.
    pub pre_nms_topk: usize,
    /// Discard reconstructed segments not longer than this (feature-grid
    /// units).
    pub duration_thresh: f32,
}

impl Default for TestParams {
    fn default() -> Self {
        Self {
            pre_nms_thresh: 0.001,
            pre_nms_topk: 2000,
            duration_thresh: 0.05,
        }
    }
}

/// Detector-wide parameters controlling the whole core.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Number of action classes.
    pub num_classes: usize,
    /// Independent per-class assignment and regression targets.
    pub multi_label: bool,
    /// Temporal stride of each pyramid level, finest first.
    pub strides: Vec<f32>,
    /// Regression range `[min, max]` owned by each level; must pair with
    /// `strides` one-to-one.
    pub regression_ranges: Vec<(f32, f32)>,
    pub trident: TridentParams,
    pub center_sampling: CenterSampling,
    pub train: TrainParams,
    pub test: TestParams,
    pub nms: NmsParams,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            num_classes: 1,
            multi_label: false,
            strides: vec![1.0, 2.0, 4.0, 8.0, 16.0, 32.0],
            regression_ranges: vec![
                (0.0, 4.0),
                (4.0, 8.0),
                (8.0, 16.0),
                (16.0, 32.0),
                (32.0, 64.0),
                (64.0, 10000.0),
            ],
            trident: TridentParams::default(),
            center_sampling: CenterSampling::default(),
            train: TrainParams::default(),
            test: TestParams::default(),
            nms: NmsParams::default(),
        }
    }
}

impl DetectorParams {
    /// Checks everything the point generator does not cover itself.
    pub(crate) fn validate(&self) -> Result<(), ParamError> {
        if self.num_classes == 0 {
            return Err(ParamError::NoClasses);
        }
        if self.trident.enabled && self.trident.num_bins == 0 {
            return Err(ParamError::NoBins);
        }
        if matches!(self.nms.method, crate::nms::NmsMethod::Soft) && self.nms.sigma <= 0.0 {
            return Err(ParamError::BadSigma {
                sigma: self.nms.sigma,
            });
        }
        Ok(())
    }
}
