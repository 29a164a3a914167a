//! Owned row-major f32 buffer for per-position sequence data.
//!
//! Carries everything the heads hand to the core: class logits `[T × C]`,
//! regression outputs `[T × D]`, assigned targets. Row access returns a
//! contiguous slice, so stage code can iterate positions without index
//! arithmetic at every call site.

/// Row-major `[rows × cols]` f32 buffer (`rows` = temporal positions).
#[derive(Clone, Debug, Default)]
pub struct SeqF32 {
    /// Number of rows (temporal positions).
    pub rows: usize,
    /// Number of columns (classes, offset channels, ...).
    pub cols: usize,
    /// Backing storage in row-major order.
    pub data: Vec<f32>,
}

impl SeqF32 {
    /// Construct a zero-initialized buffer of size `rows × cols`.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from existing row-major data. Panics if the length does not
    /// match `rows × cols` (malformed collaborator output).
    pub fn from_data(rows: usize, cols: usize, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "SeqF32 expects {rows}x{cols}={} values, got {}",
            rows * cols,
            data.len()
        );
        Self { rows, cols, data }
    }

    #[inline]
    /// Convert (row, col) to a linear index into `data`.
    pub fn idx(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    #[inline]
    /// Get the value at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[self.idx(row, col)]
    }

    #[inline]
    /// Set the value at (row, col).
    pub fn set(&mut self, row: usize, col: usize, v: f32) {
        let i = self.idx(row, col);
        self.data[i] = v;
    }

    #[inline]
    /// Contiguous view of one row.
    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    #[inline]
    /// Mutable view of one row.
    pub fn row_mut(&mut self, row: usize) -> &mut [f32] {
        let start = row * self.cols;
        let end = start + self.cols;
        &mut self.data[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_contiguous() {
        let mut s = SeqF32::new(3, 2);
        s.set(1, 0, 4.0);
        s.set(1, 1, 5.0);
        assert_eq!(s.row(1), &[4.0, 5.0]);
        assert_eq!(s.get(2, 1), 0.0);
    }

    #[test]
    #[should_panic(expected = "SeqF32 expects")]
    fn from_data_rejects_wrong_length() {
        let _ = SeqF32::from_data(2, 3, vec![0.0; 5]);
    }
}
