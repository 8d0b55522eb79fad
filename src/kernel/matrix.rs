//! Dense row-major matrix with the handful of operations the reservoir needs.
//!
//! When compiled with the `simd` feature, row dot products use SIMD-accelerated
//! implementations.

use serde::{Deserialize, Serialize};

/// Dense `rows × cols` matrix stored as one flat row-major buffer.
///
/// Deserialization goes through [`Matrix::from_flat`], so a decoded matrix
/// always has `rows * cols` elements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixRepr")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    /// `data[i * cols .. (i + 1) * cols]` = row i.
    data: Vec<f64>,
}

#[derive(Deserialize)]
struct MatrixRepr {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl TryFrom<MatrixRepr> for Matrix {
    type Error = String;

    fn try_from(repr: MatrixRepr) -> Result<Self, Self::Error> {
        let (rows, cols, len) = (repr.rows, repr.cols, repr.data.len());
        Matrix::from_flat(rows, cols, repr.data)
            .ok_or_else(|| format!("matrix {}x{} cannot hold {} elements", rows, cols, len))
    }
}

impl Matrix {
    /// Create a zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Fill a matrix cell by cell in row-major order.
    ///
    /// The visiting order is fixed, so a seeded RNG captured by `f` always
    /// produces the same matrix.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    /// Build from flat row-major data. Returns `None` if the length is wrong.
    pub fn from_flat(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return None;
        }
        Some(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Raw row-major data.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        let base = i * self.cols;
        &self.data[base..base + self.cols]
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        let base = i * self.cols;
        &mut self.data[base..base + self.cols]
    }

    /// Matrix-vector product `M · v`.
    ///
    /// # Panics
    /// Panics if `v.len() != self.cols()`.
    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(
            v.len(),
            self.cols,
            "Dimension mismatch in mul_vec: expected {}, got {}",
            self.cols,
            v.len()
        );
        (0..self.rows).map(|i| dot(self.row(i), v)).collect()
    }

    /// Multiply every element by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for x in &mut self.data {
            *x *= factor;
        }
    }

    /// Number of non-zero elements.
    pub fn nnz(&self) -> usize {
        self.data.iter().filter(|&&x| x != 0.0).count()
    }

    /// True when every element is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&x| x == 0.0)
    }
}

/// Dot product of two equal-length slices.
#[cfg(feature = "simd")]
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    use simsimd::SpatialSimilarity;
    debug_assert_eq!(a.len(), b.len());
    f64::dot(a, b).unwrap_or_else(|| dot_raw(a, b))
}

#[cfg(not(feature = "simd"))]
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    dot_raw(a, b)
}

#[inline]
fn dot_raw(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// L2 norm.
#[inline]
pub fn norm(v: &[f64]) -> f64 {
    dot_raw(v, v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let m = Matrix::zeros(3, 4);
        assert_eq!(m.shape(), (3, 4));
        assert!(m.is_zero());
        assert_eq!(m.nnz(), 0);
    }

    #[test]
    fn test_from_fn_is_row_major() {
        let m = Matrix::from_fn(2, 3, |i, j| (i * 10 + j) as f64);
        assert_eq!(m.data(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(m.row(1), &[10.0, 11.0, 12.0]);
        assert_eq!(m.get(1, 2), 12.0);
    }

    #[test]
    fn test_mul_vec() {
        let m = Matrix::from_flat(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(m.mul_vec(&[1.0, 1.0]), vec![3.0, 7.0]);
    }

    #[test]
    fn test_from_flat_rejects_bad_length() {
        assert!(Matrix::from_flat(2, 2, vec![1.0; 3]).is_none());
        assert!(Matrix::from_flat(usize::MAX, 2, vec![]).is_none());
    }

    #[test]
    fn test_json_rejects_inconsistent_data() {
        let err = serde_json::from_str::<Matrix>(r#"{"rows": 2, "cols": 2, "data": []}"#);
        assert!(err.is_err());

        let ok: Matrix = serde_json::from_str(r#"{"rows": 1, "cols": 2, "data": [1.0, 2.0]}"#).unwrap();
        assert_eq!(ok.row(0), &[1.0, 2.0]);
    }

    #[test]
    fn test_json_round_trip_is_bit_exact() {
        let m = Matrix::from_flat(1, 3, vec![-0.013729763142111572, 0.1 + 0.2, 1.0 / 3.0]).unwrap();
        let back: Matrix = serde_json::from_str(&serde_json::to_string(&m).unwrap()).unwrap();
        for (a, b) in m.data().iter().zip(back.data()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_scale_and_norm() {
        let mut m = Matrix::from_flat(1, 2, vec![3.0, 4.0]).unwrap();
        assert!((norm(m.row(0)) - 5.0).abs() < 1e-12);
        m.scale(2.0);
        assert_eq!(m.row(0), &[6.0, 8.0]);
    }
}
