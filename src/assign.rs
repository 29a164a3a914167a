//! Training-target assignment: ground-truth segments → per-position targets.
//!
//! Every concatenated pyramid point is tested against every ground-truth
//! segment. A point becomes a candidate for a segment when it passes the
//! inside test (plain membership or stride-scaled center sampling) and the
//! per-level regression-range restriction, which is what makes each pyramid
//! level responsible for a distinct duration band. Ambiguities resolve to the
//! shortest-duration segment; near-identical durations (within 1e-3) all
//! contribute their class label, so one position can carry several positive
//! classes while its regression target follows the first minimal-duration
//! segment. A pure per-sample computation with no failure modes: zero ground
//! truth yields all-background targets.

use rayon::prelude::*;

use crate::detector::params::CenterSampling;
use crate::points::Point;
use crate::seq::SeqF32;
use crate::types::TrainSample;

/// Tolerance under which tied segment durations all receive the label.
const DURATION_TIE_TOL: f32 = 1e-3;

/// Assignment policy shared by every sample of a batch.
#[derive(Clone, Copy, Debug)]
pub struct AssignConfig {
    pub num_classes: usize,
    pub multi_label: bool,
    pub center_sampling: CenterSampling,
}

/// Index-aligned classification and regression targets for one sample.
///
/// `cls` is `[FT × C]`; `reg` is `[FT × 2]` in single-label mode and
/// `[FT × 2C]` (class-major `(left, right)` pairs) in multi-label mode, both
/// normalized by the position's level stride. Regression rows are only
/// meaningful where the matching classification row is positive.
#[derive(Clone, Debug)]
pub struct AssignedTargets {
    pub cls: SeqF32,
    pub reg: SeqF32,
}

/// Assign targets for every sample of a batch over the shared point set.
pub fn assign_batch(
    points: &[Point],
    samples: &[TrainSample],
    cfg: &AssignConfig,
) -> Vec<AssignedTargets> {
    samples
        .par_iter()
        .map(|sample| assign_sample(points, sample, cfg))
        .collect()
}

/// Assign classification and regression targets for a single sample.
pub fn assign_sample(points: &[Point], sample: &TrainSample, cfg: &AssignConfig) -> AssignedTargets {
    debug_assert_eq!(sample.segments.len(), sample.labels.len());
    let num_pts = points.len();
    let reg_cols = if cfg.multi_label {
        2 * cfg.num_classes
    } else {
        2
    };
    let mut cls = SeqF32::new(num_pts, cfg.num_classes);
    let mut reg = SeqF32::new(num_pts, reg_cols);

    if sample.segments.is_empty() {
        return AssignedTargets { cls, reg };
    }

    // (left, right, duration) per candidate ground truth of one position
    let mut candidates: Vec<(usize, f32, f32, f32)> = Vec::with_capacity(sample.segments.len());

    for (i, pt) in points.iter().enumerate() {
        candidates.clear();
        for (j, seg) in sample.segments.iter().enumerate() {
            let left = pt.position - seg.start;
            let right = seg.end - pt.position;

            let inside = match cfg.center_sampling {
                CenterSampling::Radius { radius } => {
                    let center = 0.5 * (seg.start + seg.end);
                    // sampling window clipped to the segment itself
                    let t_min = (center - pt.stride * radius).max(seg.start);
                    let t_max = (center + pt.stride * radius).min(seg.end);
                    (pt.position - t_min).min(t_max - pt.position) > 0.0
                }
                CenterSampling::None => left.min(right) > 0.0,
            };
            if !inside {
                continue;
            }
            let reach = left.max(right);
            if reach < pt.range_min || reach > pt.range_max {
                continue;
            }
            candidates.push((j, left, right, seg.length()));
        }
        if candidates.is_empty() {
            continue;
        }

        if cfg.multi_label {
            // every satisfying (position, class) pair accumulates independently;
            // later ground truths of the same class overwrite the regression pair
            for &(j, left, right, _) in &candidates {
                let label = sample.labels[j];
                cls.set(i, label, 1.0);
                let row = reg.row_mut(i);
                row[2 * label] = left / pt.stride;
                row[2 * label + 1] = right / pt.stride;
            }
        } else {
            let (mut min_len, mut min_j) = (f32::INFINITY, 0usize);
            for &(j, _, _, len) in &candidates {
                if len < min_len {
                    min_len = len;
                    min_j = j;
                }
            }
            for &(j, _, _, len) in &candidates {
                if len <= min_len + DURATION_TIE_TOL {
                    cls.set(i, sample.labels[j], 1.0);
                }
            }
            let &(_, left, right, _) = candidates
                .iter()
                .find(|&&(j, ..)| j == min_j)
                .unwrap_or(&candidates[0]);
            let row = reg.row_mut(i);
            row[0] = left / pt.stride;
            row[1] = right / pt.stride;
        }
    }

    AssignedTargets { cls, reg }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Segment;

    fn stride1_points(len: usize, range: (f32, f32)) -> Vec<Point> {
        (0..len)
            .map(|i| Point {
                position: i as f32 + 0.5,
                range_min: range.0,
                range_max: range.1,
                stride: 1.0,
            })
            .collect()
    }

    fn cfg(num_classes: usize) -> AssignConfig {
        AssignConfig {
            num_classes,
            multi_label: false,
            center_sampling: CenterSampling::None,
        }
    }

    #[test]
    fn no_ground_truth_yields_all_background() {
        let points = stride1_points(16, (0.0, 16.0));
        let t = assign_sample(&points, &TrainSample::default(), &cfg(3));
        assert!(t.cls.data.iter().all(|&v| v == 0.0));
        assert!(t.reg.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn inside_positions_get_class_and_boundary_distances() {
        let points = stride1_points(32, (0.0, 16.0));
        let sample = TrainSample {
            segments: vec![Segment::new(10.0, 20.0)],
            labels: vec![2],
        };
        let t = assign_sample(&points, &sample, &cfg(3));
        for (i, pt) in points.iter().enumerate() {
            let inside = pt.position > 10.0 && pt.position < 20.0;
            if inside {
                assert_eq!(t.cls.get(i, 2), 1.0, "position {}", pt.position);
                assert_eq!(t.cls.row(i).iter().sum::<f32>(), 1.0);
                assert_eq!(t.reg.get(i, 0), pt.position - 10.0);
                assert_eq!(t.reg.get(i, 1), 20.0 - pt.position);
            } else {
                assert!(t.cls.row(i).iter().all(|&v| v == 0.0));
            }
        }
    }

    #[test]
    fn regression_range_bounds_each_level() {
        // reach = max(left, right) must lie within [4, 8]
        let points = stride1_points(32, (4.0, 8.0));
        let sample = TrainSample {
            segments: vec![Segment::new(10.0, 20.0)],
            labels: vec![0],
        };
        let t = assign_sample(&points, &sample, &cfg(1));
        for (i, pt) in points.iter().enumerate() {
            let left = pt.position - 10.0;
            let right = 20.0 - pt.position;
            let reach = left.max(right);
            let expect = left.min(right) > 0.0 && (4.0..=8.0).contains(&reach);
            assert_eq!(t.cls.get(i, 0) > 0.0, expect, "position {}", pt.position);
        }
    }

    #[test]
    fn shortest_duration_wins_and_sets_regression() {
        let points = stride1_points(32, (0.0, 32.0));
        let sample = TrainSample {
            segments: vec![Segment::new(5.0, 25.0), Segment::new(10.0, 18.0)],
            labels: vec![0, 1],
        };
        let t = assign_sample(&points, &sample, &cfg(2));
        // a position inside both segments: the shorter one owns it
        let i = 12; // position 12.5
        assert_eq!(t.cls.get(i, 0), 0.0);
        assert_eq!(t.cls.get(i, 1), 1.0);
        assert_eq!(t.reg.get(i, 0), 12.5 - 10.0);
        assert_eq!(t.reg.get(i, 1), 18.0 - 12.5);
        // a position only inside the long segment keeps its label
        let j = 6; // position 6.5
        assert_eq!(t.cls.get(j, 0), 1.0);
        assert_eq!(t.reg.get(j, 0), 6.5 - 5.0);
    }

    #[test]
    fn near_tied_durations_all_contribute_labels() {
        let points = stride1_points(32, (0.0, 32.0));
        let sample = TrainSample {
            segments: vec![Segment::new(10.0, 20.0), Segment::new(10.0005, 20.0)],
            labels: vec![0, 1],
        };
        let t = assign_sample(&points, &sample, &cfg(2));
        let i = 15; // inside both, durations differ by 5e-4 < 1e-3
        assert_eq!(t.cls.get(i, 0), 1.0);
        assert_eq!(t.cls.get(i, 1), 1.0);
        // regression follows the first minimal-duration segment
        assert_eq!(t.reg.get(i, 0), 15.5 - 10.0005);
    }

    #[test]
    fn center_sampling_restricts_to_segment_middle() {
        let points = stride1_points(64, (0.0, 64.0));
        let sample = TrainSample {
            segments: vec![Segment::new(10.0, 50.0)],
            labels: vec![0],
        };
        let cfg = AssignConfig {
            num_classes: 1,
            multi_label: false,
            center_sampling: CenterSampling::Radius { radius: 1.5 },
        };
        let t = assign_sample(&points, &sample, &cfg);
        // center = 30, stride 1, radius 1.5 -> only positions in (28.5, 31.5)
        for (i, pt) in points.iter().enumerate() {
            let expect = pt.position > 28.5 && pt.position < 31.5;
            assert_eq!(t.cls.get(i, 0) > 0.0, expect, "position {}", pt.position);
        }
    }

    #[test]
    fn center_sampling_window_clips_to_short_segments() {
        let points = stride1_points(16, (0.0, 16.0));
        let sample = TrainSample {
            segments: vec![Segment::new(4.0, 6.0)],
            labels: vec![0],
        };
        let cfg = AssignConfig {
            num_classes: 1,
            multi_label: false,
            center_sampling: CenterSampling::Radius { radius: 8.0 },
        };
        let t = assign_sample(&points, &sample, &cfg);
        // huge radius still may not leak outside the segment itself
        for (i, pt) in points.iter().enumerate() {
            let expect = pt.position > 4.0 && pt.position < 6.0;
            assert_eq!(t.cls.get(i, 0) > 0.0, expect, "position {}", pt.position);
        }
    }

    #[test]
    fn multi_label_accumulates_per_class_targets() {
        let points = stride1_points(32, (0.0, 32.0));
        let sample = TrainSample {
            segments: vec![Segment::new(5.0, 25.0), Segment::new(10.0, 18.0)],
            labels: vec![0, 1],
        };
        let cfg = AssignConfig {
            num_classes: 2,
            multi_label: true,
            center_sampling: CenterSampling::None,
        };
        let t = assign_sample(&points, &sample, &cfg);
        let i = 12; // position 12.5, inside both
        assert_eq!(t.cls.get(i, 0), 1.0);
        assert_eq!(t.cls.get(i, 1), 1.0);
        assert_eq!(t.reg.row(i), &[12.5 - 5.0, 25.0 - 12.5, 12.5 - 10.0, 18.0 - 12.5]);
        let j = 6; // position 6.5, only the class-0 segment
        assert_eq!(t.cls.get(j, 1), 0.0);
        assert_eq!(t.reg.get(j, 2), 0.0);
    }

    #[test]
    fn stride_normalizes_regression_targets() {
        let points: Vec<Point> = (0..8)
            .map(|i| Point {
                position: 4.0 * (i as f32 + 0.5),
                range_min: 0.0,
                range_max: 64.0,
                stride: 4.0,
            })
            .collect();
        let sample = TrainSample {
            segments: vec![Segment::new(0.0, 32.0)],
            labels: vec![0],
        };
        let t = assign_sample(&points, &sample, &cfg(1));
        let i = 3; // position 14
        assert_eq!(t.reg.get(i, 0), 14.0 / 4.0);
        assert_eq!(t.reg.get(i, 1), (32.0 - 14.0) / 4.0);
    }

    #[test]
    fn batch_assignment_matches_per_sample() {
        let points = stride1_points(16, (0.0, 16.0));
        let samples = vec![
            TrainSample {
                segments: vec![Segment::new(2.0, 8.0)],
                labels: vec![0],
            },
            TrainSample::default(),
        ];
        let batch = assign_batch(&points, &samples, &cfg(1));
        let single = assign_sample(&points, &samples[0], &cfg(1));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].cls.data, single.cls.data);
        assert!(batch[1].cls.data.iter().all(|&v| v == 0.0));
    }
}
