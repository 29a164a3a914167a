//! Runtime configuration for the CLI entry point.
//!
//! The detector itself is configured through [`DetectorParams`]; this module
//! adds the thin file-level wrapper the binary reads: where to put the JSON
//! report, plus the detector parameter block. Every field is optional and
//! falls back to its default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::DetectorParams;

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write the full detection report (result + trace) as JSON here.
    pub json_out: Option<PathBuf>,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub output: OutputConfig,
    pub detector: DetectorParams,
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: RuntimeConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: RuntimeConfig =
            serde_json::from_str(r#"{"detector": {"num_classes": 20}}"#).unwrap();
        assert_eq!(cfg.detector.num_classes, 20);
        assert_eq!(cfg.detector.strides.len(), 6);
        assert!(cfg.output.json_out.is_none());
    }

    #[test]
    fn nms_method_parses_from_snake_case() {
        let cfg: RuntimeConfig = serde_json::from_str(
            r#"{"detector": {"nms": {"method": "hard", "iou_threshold": 0.3}}}"#,
        )
        .unwrap();
        assert!(matches!(cfg.detector.nms.method, crate::nms::NmsMethod::Hard));
        assert!((cfg.detector.nms.iou_threshold - 0.3).abs() < 1e-6);
    }
}
