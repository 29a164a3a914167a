//! Conversion of suppressed candidates into wall-clock detections.
//!
//! All pipeline stages up to and including NMS work on feature-grid
//! coordinates. The final step maps grid units to seconds through the video
//! metadata and clamps everything into the video extent.

use crate::types::{Candidate, DetectionResult, VideoMeta};

/// Map one grid coordinate to seconds:
/// `(grid × stride + 0.5 × num_frames) / fps`, clamped to `[0, duration]`.
#[inline]
pub fn grid_to_seconds(grid: f32, meta: &VideoMeta) -> f32 {
    let sec = (grid * meta.feat_stride + 0.5 * meta.feat_num_frames) / meta.fps;
    sec.clamp(0.0, meta.duration)
}

/// Repack final candidates as a per-video result with timestamps in seconds.
pub fn to_seconds(candidates: &[Candidate], meta: &VideoMeta) -> DetectionResult {
    let mut result = DetectionResult {
        video_id: meta.video_id.clone(),
        segments: Vec::with_capacity(candidates.len()),
        scores: Vec::with_capacity(candidates.len()),
        labels: Vec::with_capacity(candidates.len()),
    };
    for c in candidates {
        let mut seg = c.segment;
        seg.start = grid_to_seconds(seg.start, meta);
        seg.end = grid_to_seconds(seg.end, meta);
        result.segments.push(seg);
        result.scores.push(c.score);
        result.labels.push(c.label);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Segment;

    fn meta() -> VideoMeta {
        VideoMeta {
            video_id: "vid".into(),
            fps: 25.0,
            duration: 10.0,
            feat_stride: 4.0,
            feat_num_frames: 16.0,
        }
    }

    #[test]
    fn grid_units_convert_with_frame_centering() {
        let cands = [Candidate {
            segment: Segment::new(10.0, 20.0),
            score: 0.9,
            label: 3,
        }];
        let out = to_seconds(&cands, &meta());
        // (10*4 + 8)/25 and (20*4 + 8)/25
        assert!((out.segments[0].start - 48.0 / 25.0).abs() < 1e-6);
        assert!((out.segments[0].end - 88.0 / 25.0).abs() < 1e-6);
        assert_eq!(out.labels, vec![3]);
        assert_eq!(out.video_id, "vid");
    }

    #[test]
    fn timestamps_clamp_to_video_extent() {
        let cands = [Candidate {
            segment: Segment::new(-5.0, 1000.0),
            score: 0.5,
            label: 0,
        }];
        let out = to_seconds(&cands, &meta());
        assert_eq!(out.segments[0].start, 0.0);
        assert_eq!(out.segments[0].end, 10.0);
    }

    #[test]
    fn empty_candidates_yield_empty_result() {
        let out = to_seconds(&[], &meta());
        assert!(out.is_empty());
    }
}
