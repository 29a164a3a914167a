//! Batched non-maximum suppression over 1-D candidate segments.
//!
//! Candidates from every pyramid level arrive concatenated; suppression runs
//! either jointly or independently per class (`multiclass`), in one of three
//! modes: classic greedy (`hard`), Gaussian score decay (`soft`) or `none`.
//! Score voting optionally refines each kept boundary by score-weighted
//! averaging over near-duplicate candidates; it applies after both hard and
//! soft suppression. The final set is capped to `max_seg_num` by score and
//! filtered to `score ≥ min_score`.

use serde::Deserialize;

use crate::types::{Candidate, Segment};

/// Suppression mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NmsMethod {
    Hard,
    Soft,
    None,
}

/// Suppression configuration.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct NmsParams {
    pub method: NmsMethod,
    pub iou_threshold: f32,
    pub min_score: f32,
    pub max_seg_num: usize,
    /// Suppress independently per class; segments of different classes never
    /// interact.
    pub multiclass: bool,
    /// Gaussian decay width for soft suppression.
    pub sigma: f32,
    /// IoU band for score voting; non-positive disables voting.
    pub voting_thresh: f32,
}

impl Default for NmsParams {
    fn default() -> Self {
        Self {
            method: NmsMethod::Soft,
            iou_threshold: 0.1,
            min_score: 0.001,
            max_seg_num: 200,
            multiclass: true,
            sigma: 0.5,
            voting_thresh: 0.75,
        }
    }
}

/// Temporal IoU of two segments: intersection over union, zero when
/// disjoint. Degenerate (non-positive length) segments score zero.
#[inline]
pub fn iou_1d(a: Segment, b: Segment) -> f32 {
    let inter = a.end.min(b.end) - a.start.max(b.start);
    if inter <= 0.0 {
        return 0.0;
    }
    let union = a.end.max(b.end) - a.start.min(b.start);
    if union <= 0.0 {
        return 0.0;
    }
    inter / union
}

/// Reduce concatenated candidates to the final detection set.
pub fn batched_nms(candidates: Vec<Candidate>, params: &NmsParams) -> Vec<Candidate> {
    let mut kept = match params.method {
        NmsMethod::None => candidates,
        NmsMethod::Hard | NmsMethod::Soft => {
            if params.multiclass {
                let mut labels: Vec<usize> = candidates.iter().map(|c| c.label).collect();
                labels.sort_unstable();
                labels.dedup();
                let mut out = Vec::with_capacity(candidates.len());
                for label in labels {
                    let group: Vec<Candidate> = candidates
                        .iter()
                        .filter(|c| c.label == label)
                        .copied()
                        .collect();
                    out.extend(suppress(group, params));
                }
                out
            } else {
                suppress(candidates, params)
            }
        }
    };

    // cap by score, then the score floor
    sort_by_score_desc(&mut kept);
    kept.truncate(params.max_seg_num);
    kept.retain(|c| c.score >= params.min_score);
    kept
}

fn sort_by_score_desc(cands: &mut [Candidate]) {
    cands.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
}

/// Run one suppression round over a single class group (or over everything
/// when multiclass is off).
fn suppress(group: Vec<Candidate>, params: &NmsParams) -> Vec<Candidate> {
    let originals = group.clone();
    let mut kept = match params.method {
        NmsMethod::Hard => hard_nms(group, params.iou_threshold),
        NmsMethod::Soft => soft_nms(group, params.sigma, params.min_score),
        NmsMethod::None => group,
    };
    if params.voting_thresh > 0.0 {
        for c in &mut kept {
            c.segment = vote_boundaries(c.segment, &originals, params.voting_thresh);
        }
    }
    kept
}

/// Classic greedy suppression: keep the best remaining candidate, drop
/// everything overlapping it beyond the threshold.
fn hard_nms(mut work: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    sort_by_score_desc(&mut work);
    let mut kept = Vec::with_capacity(work.len());
    while !work.is_empty() {
        let best = work.remove(0);
        work.retain(|c| iou_1d(best.segment, c.segment) <= iou_threshold);
        kept.push(best);
    }
    kept
}

/// Gaussian soft suppression: instead of discarding overlaps, decay their
/// scores by `exp(−iou²/σ)`. Candidates whose decayed score can no longer
/// clear the output floor are abandoned early.
fn soft_nms(mut work: Vec<Candidate>, sigma: f32, score_floor: f32) -> Vec<Candidate> {
    let mut kept = Vec::with_capacity(work.len());
    while !work.is_empty() {
        let best_idx = work
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
        let best = work.swap_remove(best_idx);
        if best.score < score_floor {
            break;
        }
        for c in &mut work {
            let iou = iou_1d(best.segment, c.segment);
            if iou > 0.0 {
                c.score *= (-(iou * iou) / sigma).exp();
            }
        }
        kept.push(best);
    }
    kept
}

/// Score-weighted boundary averaging over candidates within the voting IoU
/// band of a kept segment, using pre-decay scores.
fn vote_boundaries(kept: Segment, originals: &[Candidate], voting_thresh: f32) -> Segment {
    let mut weight = 0.0f32;
    let mut start = 0.0f32;
    let mut end = 0.0f32;
    for c in originals {
        if iou_1d(kept, c.segment) > voting_thresh {
            weight += c.score;
            start += c.score * c.segment.start;
            end += c.score * c.segment.end;
        }
    }
    if weight > 0.0 {
        Segment::new(start / weight, end / weight)
    } else {
        kept
    }
}
