//! 1-D IoU measures on centre-offset pairs.
//!
//! Both prediction and target describe a segment as `(left, right)` distances
//! from a shared centre point, in stride units. Intersection and union reduce
//! to sums of per-side minima and maxima.

const EPS: f32 = 1e-8;

/// Signed generalized IoU between two centre-offset pairs, in `[-1, 1]`.
#[inline]
pub fn ctr_giou_1d(pred: (f32, f32), target: (f32, f32)) -> f32 {
    let (lp, rp) = pred;
    let (lg, rg) = target;
    let inter = lp.min(lg) + rp.min(rg);
    let union = (lp + rp) + (lg + rg) - inter;
    let iou = inter / union.max(EPS);
    // smallest enclosing interval
    let len_c = lp.max(lg) + rp.max(rg);
    iou - (len_c - union) / len_c.max(EPS)
}

/// Distance-IoU loss between two centre-offset pairs: `1 − IoU` plus the
/// squared centre distance normalized by the enclosing length.
#[inline]
pub fn ctr_diou_loss_1d(pred: (f32, f32), target: (f32, f32)) -> f32 {
    let (lp, rp) = pred;
    let (lg, rg) = target;
    let inter = lp.min(lg) + rp.min(rg);
    let union = (lp + rp) + (lg + rg) - inter;
    let iou = inter / union.max(EPS);
    let len_c = lp.max(lg) + rp.max(rg);
    // midpoints of the two segments relative to the shared centre
    let rho = 0.5 * ((rp - lp) - (rg - lg));
    1.0 - iou + (rho / len_c.max(EPS)).powi(2)
}
