//! Per-position point descriptors along the feature pyramid.
//!
//! Each pyramid level gets one ordered sequence of [`Point`]s; concatenated
//! across levels they form the canonical position index shared by target
//! assignment and inference decoding. Generation is a pure function of the
//! per-level sequence lengths and the level metadata, so the generator caches
//! the last result and reuses it while the lengths stay unchanged (inference
//! typically pads every video to the same grid).

use std::sync::Arc;

use crate::detector::params::ParamError;

/// Anchor descriptor for one temporal position of one pyramid level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    /// Temporal coordinate on the full-resolution feature grid.
    pub position: f32,
    /// Lower bound of the regression range owned by this level.
    pub range_min: f32,
    /// Upper bound of the regression range owned by this level.
    pub range_max: f32,
    /// Temporal stride of this level.
    pub stride: f32,
}

/// Static metadata of one pyramid level.
#[derive(Clone, Copy, Debug)]
pub struct LevelSpec {
    pub stride: f32,
    pub range_min: f32,
    pub range_max: f32,
}

/// Generates and caches per-level point sequences.
#[derive(Debug)]
pub struct PointGenerator {
    levels: Vec<LevelSpec>,
    cache: Option<(Vec<usize>, Arc<Vec<Vec<Point>>>)>,
}

impl PointGenerator {
    /// Build a generator from per-level strides and regression ranges.
    ///
    /// The two lists must pair up one-to-one; a count mismatch or a
    /// degenerate range is a configuration error.
    pub fn new(strides: &[f32], ranges: &[(f32, f32)]) -> Result<Self, ParamError> {
        if strides.is_empty() {
            return Err(ParamError::NoLevels);
        }
        if strides.len() != ranges.len() {
            return Err(ParamError::RangeCountMismatch {
                levels: strides.len(),
                ranges: ranges.len(),
            });
        }
        let mut levels = Vec::with_capacity(strides.len());
        for (i, (&stride, &(lo, hi))) in strides.iter().zip(ranges).enumerate() {
            if stride <= 0.0 {
                return Err(ParamError::BadStride { level: i, stride });
            }
            if !(lo < hi) || lo < 0.0 {
                return Err(ParamError::BadRange { level: i, lo, hi });
            }
            levels.push(LevelSpec {
                stride,
                range_min: lo,
                range_max: hi,
            });
        }
        Ok(Self {
            levels,
            cache: None,
        })
    }

    /// Number of pyramid levels.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Produce one point sequence per level for the given per-level lengths.
    ///
    /// `position = stride × (index + 0.5)` (cell-center convention); range
    /// and stride broadcast to every position of the level. Panics if
    /// `lens.len()` differs from the configured level count (collaborator
    /// shape violation).
    pub fn generate(&mut self, lens: &[usize]) -> Arc<Vec<Vec<Point>>> {
        assert_eq!(
            lens.len(),
            self.levels.len(),
            "expected {} per-level lengths, got {}",
            self.levels.len(),
            lens.len()
        );
        if let Some((cached_lens, points)) = &self.cache {
            if cached_lens == lens {
                return Arc::clone(points);
            }
        }

        let per_level: Vec<Vec<Point>> = self
            .levels
            .iter()
            .zip(lens)
            .map(|(spec, &len)| {
                (0..len)
                    .map(|i| Point {
                        position: spec.stride * (i as f32 + 0.5),
                        range_min: spec.range_min,
                        range_max: spec.range_max,
                        stride: spec.stride,
                    })
                    .collect()
            })
            .collect();
        let points = Arc::new(per_level);
        self.cache = Some((lens.to_vec(), Arc::clone(&points)));
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> PointGenerator {
        PointGenerator::new(&[1.0, 2.0, 4.0], &[(0.0, 4.0), (4.0, 8.0), (8.0, 10000.0)]).unwrap()
    }

    #[test]
    fn positions_follow_cell_center_convention() {
        let mut gen = generator();
        let pts = gen.generate(&[8, 4, 2]);
        assert_eq!(pts.len(), 3);
        for (level, level_pts) in pts.iter().enumerate() {
            let stride = [1.0, 2.0, 4.0][level];
            for (i, p) in level_pts.iter().enumerate() {
                assert_eq!(p.position, stride * (i as f32 + 0.5));
                assert_eq!(p.stride, stride);
            }
        }
        // range broadcast across the level
        assert!(pts[1].iter().all(|p| p.range_min == 4.0 && p.range_max == 8.0));
    }

    #[test]
    fn total_point_count_matches_level_lengths() {
        let mut gen = generator();
        let pts = gen.generate(&[100, 50, 25]);
        let total: usize = pts.iter().map(|l| l.len()).sum();
        assert_eq!(total, 175);
    }

    #[test]
    fn cache_reuses_identical_lengths() {
        let mut gen = generator();
        let a = gen.generate(&[8, 4, 2]);
        let b = gen.generate(&[8, 4, 2]);
        assert!(Arc::ptr_eq(&a, &b));
        let c = gen.generate(&[16, 8, 4]);
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn range_count_mismatch_is_rejected() {
        let err = PointGenerator::new(&[1.0, 2.0], &[(0.0, 4.0)]).unwrap_err();
        assert!(matches!(err, ParamError::RangeCountMismatch { .. }));
    }
}
