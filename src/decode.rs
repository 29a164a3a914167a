//! Decoding of regression-head outputs into continuous boundary offsets.
//!
//! Two strategies, fixed at construction:
//!
//! - **Direct**: the regression head already predicts `(left, right)` offsets
//!   in stride units; they are used as-is (per class in multi-label mode).
//! - **Trident**: each side is predicted as a distribution over `num_bins+1`
//!   discretized distances. For a position `t` the left distribution reads
//!   the start-boundary logit at `t−d` for every distance `d` (zero beyond
//!   the sequence start) and the right distribution reads the end-boundary
//!   logit at `t+d` (zero beyond the end). A per-position bin-prior vector
//!   from the regression head is added element-wise, the result is
//!   softmax-normalized over the bin dimension and collapsed to its
//!   expectation. Any distribution contaminated by NaN decodes to zero
//!   instead of propagating.
//!
//! The same per-position routine serves the batched training path (evaluated
//! at every positive position) and the unbatched inference path (evaluated
//! only at retained `(position, class)` pairs), so the two stay numerically
//! identical by construction.

use crate::seq::SeqF32;
use crate::types::LevelOutput;

/// Offset decoding strategy, resolved once from the detector configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeMode {
    /// Raw regression values.
    Direct,
    /// Boundary-distribution decoding over `num_bins + 1` distance bins.
    Trident { num_bins: usize },
}

/// Converts per-position regression outputs (plus boundary logits in Trident
/// mode) into continuous `(left, right)` offsets in stride units.
#[derive(Clone, Copy, Debug)]
pub struct OffsetDecoder {
    mode: DecodeMode,
    num_classes: usize,
    multi_label: bool,
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl OffsetDecoder {
    pub fn new(mode: DecodeMode, num_classes: usize, multi_label: bool) -> Self {
        Self {
            mode,
            num_classes,
            multi_label,
        }
    }

    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Width `D` the regression head must produce per position.
    pub fn reg_width(&self) -> usize {
        match (self.mode, self.multi_label) {
            (DecodeMode::Direct, false) => 2,
            (DecodeMode::Direct, true) => 2 * self.num_classes,
            (DecodeMode::Trident { num_bins }, false) => 2 * (num_bins + 1),
            (DecodeMode::Trident { num_bins }, true) => 2 * self.num_classes * (num_bins + 1),
        }
    }

    /// Decode the `(left, right)` offsets at one `(position, class)` pair.
    ///
    /// `cls` is ignored in single-label direct mode. Panics with the expected
    /// shape when the head outputs do not match the configured mode.
    pub fn decode_at(&self, level: &LevelOutput, t: usize, cls: usize) -> (f32, f32) {
        let reg = &level.reg_outputs;
        assert_eq!(
            reg.cols,
            self.reg_width(),
            "regression output must be [T x {}] for this decode mode, got [T x {}]",
            self.reg_width(),
            reg.cols
        );
        let row = reg.row(t);

        match self.mode {
            DecodeMode::Direct => {
                if self.multi_label {
                    (row[2 * cls], row[2 * cls + 1])
                } else {
                    (row[0], row[1])
                }
            }
            DecodeMode::Trident { num_bins } => {
                let start = level
                    .start_logits
                    .as_ref()
                    .expect("Trident decoding requires [T x C] start-boundary logits");
                let end = level
                    .end_logits
                    .as_ref()
                    .expect("Trident decoding requires [T x C] end-boundary logits");
                let bins = num_bins + 1;
                let (prior_left, prior_right) = if self.multi_label {
                    let l = cls * bins;
                    let r = (self.num_classes + cls) * bins;
                    (&row[l..l + bins], &row[r..r + bins])
                } else {
                    (&row[..bins], &row[bins..])
                };
                let left = expectation(start, t, cls, num_bins, prior_left, Side::Left);
                let right = expectation(end, t, cls, num_bins, prior_right, Side::Right);
                (left, right)
            }
        }
    }
}

/// Expectation of the distance distribution for one side of one position.
///
/// The bin prior is indexed by window element, i.e. temporal order: for the
/// left side element `k` sits at distance `num_bins − k`, for the right side
/// at distance `k`.
fn expectation(
    boundary: &SeqF32,
    t: usize,
    cls: usize,
    num_bins: usize,
    prior: &[f32],
    side: Side,
) -> f32 {
    let len = boundary.rows;
    // logit for distance d, zero-padded at the sequence border
    let logit = |d: usize| -> f32 {
        let evidence = match side {
            Side::Left => {
                if d > t {
                    0.0
                } else {
                    boundary.get(t - d, cls)
                }
            }
            Side::Right => {
                if t + d >= len {
                    0.0
                } else {
                    boundary.get(t + d, cls)
                }
            }
        };
        let k = match side {
            Side::Left => num_bins - d,
            Side::Right => d,
        };
        evidence + prior[k]
    };

    let mut max = f32::NEG_INFINITY;
    for d in 0..=num_bins {
        let v = logit(d);
        if v.is_nan() {
            return 0.0;
        }
        max = max.max(v);
    }

    let mut norm = 0.0f32;
    let mut acc = 0.0f32;
    for d in 0..=num_bins {
        let p = (logit(d) - max).exp();
        norm += p;
        acc += d as f32 * p;
    }
    acc / norm
}
