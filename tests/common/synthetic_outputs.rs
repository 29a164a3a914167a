use action_detector::prelude::*;

/// Head outputs for a pyramid in direct decoding mode: confident logits and
/// exact stride-normalized offsets at every position inside a ground-truth
/// segment, background logits elsewhere.
pub fn direct_pyramid(
    strides: &[f32],
    lens: &[usize],
    actions: &[(Segment, usize)],
    num_classes: usize,
) -> Vec<LevelOutput> {
    assert_eq!(strides.len(), lens.len(), "one length per pyramid level");
    let mut levels = Vec::with_capacity(lens.len());
    for (&stride, &len) in strides.iter().zip(lens) {
        let mut cls_logits = SeqF32::from_data(len, num_classes, vec![-8.0; len * num_classes]);
        let mut reg_outputs = SeqF32::new(len, 2);
        for t in 0..len {
            let pos = stride * (t as f32 + 0.5);
            for &(seg, label) in actions {
                if pos >= seg.start && pos < seg.end {
                    cls_logits.set(t, label, 4.0);
                    reg_outputs.set(t, 0, (pos - seg.start) / stride);
                    reg_outputs.set(t, 1, (seg.end - pos) / stride);
                }
            }
        }
        levels.push(LevelOutput {
            cls_logits,
            reg_outputs,
            start_logits: None,
            end_logits: None,
            mask: vec![true; len],
        });
    }
    levels
}

/// Metadata with an identity grid-to-seconds mapping.
pub fn identity_meta(duration: f32) -> VideoMeta {
    VideoMeta {
        video_id: "synthetic".into(),
        fps: 1.0,
        duration,
        feat_stride: 1.0,
        feat_num_frames: 0.0,
    }
}
