use std::path::Path;

use action_detector::config::{load_config, RuntimeConfig};
use action_detector::prelude::*;

/// Synthetic head outputs for one pyramid of the given per-level lengths,
/// with a single confident action spanning grid positions [10, 20).
fn synthetic_levels(params: &DetectorParams, lens: &[usize]) -> Vec<LevelOutput> {
    let c_num = params.num_classes;
    let bins = params.trident.num_bins;
    let reg_cols = if params.trident.enabled {
        2 * (bins + 1)
    } else {
        2
    };
    let mut levels = Vec::with_capacity(lens.len());
    for (&len, &stride) in lens.iter().zip(&params.strides) {
        let mut cls_logits = SeqF32::from_data(len, c_num, vec![-8.0; len * c_num]);
        let mut reg_outputs = SeqF32::new(len, reg_cols);
        let mut start_logits = SeqF32::new(len, c_num);
        let mut end_logits = SeqF32::new(len, c_num);
        for t in 0..len {
            let pos = stride * (t as f32 + 0.5);
            if (10.0..20.0).contains(&pos) {
                cls_logits.set(t, 0, 4.0);
                if params.trident.enabled {
                    // bin priors peaked at the true boundary distance; the
                    // left window is laid out in temporal order, so distance
                    // d sits at element bins - d
                    let d_left = (((pos - 10.0) / stride).round() as usize).min(bins);
                    let d_right = (((20.0 - pos) / stride).round() as usize).min(bins);
                    reg_outputs.set(t, bins - d_left, 6.0);
                    reg_outputs.set(t, (bins + 1) + d_right, 6.0);
                } else {
                    reg_outputs.set(t, 0, (pos - 10.0) / stride);
                    reg_outputs.set(t, 1, (20.0 - pos) / stride);
                }
            }
            if (pos - 10.0).abs() < stride {
                start_logits.set(t, 0, 5.0);
            }
            if (pos - 20.0).abs() < stride {
                end_logits.set(t, 0, 5.0);
            }
        }
        let (start_logits, end_logits) = if params.trident.enabled {
            (Some(start_logits), Some(end_logits))
        } else {
            (None, None)
        };
        levels.push(LevelOutput {
            cls_logits,
            reg_outputs,
            start_logits,
            end_logits,
            mask: vec![true; len],
        });
    }
    levels
}

fn main() {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match load_config(Path::new(&path)) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("{err}");
                std::process::exit(1);
            }
        },
        None => RuntimeConfig::default(),
    };

    let mut det = match ActionDetector::new(config.detector.clone()) {
        Ok(det) => det,
        Err(err) => {
            eprintln!("Invalid detector parameters: {err}");
            std::process::exit(1);
        }
    };

    // Demo stub: fabricate a pyramid with one obvious action and run the
    // full inference path over it.
    let mut lens = Vec::with_capacity(config.detector.strides.len());
    let mut len = 256usize;
    for _ in &config.detector.strides {
        lens.push(len);
        len = (len / 2).max(1);
    }
    let levels = synthetic_levels(&config.detector, &lens);
    let meta = VideoMeta {
        video_id: "demo".into(),
        fps: 30.0,
        duration: 60.0,
        feat_stride: 4.0,
        feat_num_frames: 16.0,
    };

    let report = det.process_with_diagnostics(&meta, &levels);
    println!(
        "video={} detections={} pre_nms={} total_ms={:.3}",
        report.result.video_id,
        report.result.len(),
        report.trace.pre_nms,
        report.trace.timing.total_ms
    );
    for ((seg, score), label) in report
        .result
        .segments
        .iter()
        .zip(&report.result.scores)
        .zip(&report.result.labels)
        .take(5)
    {
        println!(
            "  [{:.2}s, {:.2}s] class {} score {:.3}",
            seg.start, seg.end, label, score
        );
    }

    if let Some(path) = &config.output.json_out {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                if let Err(err) = std::fs::write(path, json) {
                    eprintln!("Failed to write {}: {err}", path.display());
                    std::process::exit(1);
                }
                println!("report written to {}", path.display());
            }
            Err(err) => {
                eprintln!("Failed to serialize report: {err}");
                std::process::exit(1);
            }
        }
    }
}
