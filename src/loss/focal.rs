//! Sigmoid focal loss on a single logit/target entry.

/// Weighting factor for positive examples.
const ALPHA: f32 = 0.25;
/// Focusing exponent down-weighting easy examples.
const GAMMA: f32 = 2.0;

/// Focal loss for one (logit, soft target) entry.
///
/// Targets may be non-binary (label smoothing); the cross entropy uses the
/// numerically stable log-sum-exp form so large logits cannot overflow.
#[inline]
pub fn sigmoid_focal_loss(logit: f32, target: f32) -> f32 {
    let p = 1.0 / (1.0 + (-logit).exp());
    // bce with logits: max(x, 0) - x*t + ln(1 + exp(-|x|))
    let ce = logit.max(0.0) - logit * target + (-logit.abs()).exp().ln_1p();
    let p_t = p * target + (1.0 - p) * (1.0 - target);
    let alpha_t = ALPHA * target + (1.0 - ALPHA) * (1.0 - target);
    alpha_t * ce * (1.0 - p_t).powf(GAMMA)
}
