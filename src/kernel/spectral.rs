//! Spectral-radius control for the recurrent weight matrix.
//!
//! # Algorithm
//!
//! Power iteration from a random unit vector: multiply, renormalize, repeat a
//! fixed number of times, then take the Rayleigh quotient `vᵀMv` of the final
//! iterate as the dominant eigenvalue estimate. The matrix is rescaled by
//! `target / |estimate|` so its estimated spectral radius equals `target`.
//!
//! The estimate is linear in the matrix for a fixed start vector, so
//! re-estimating a rescaled matrix from the same start vector returns exactly
//! the target (up to rounding).

use super::matrix::{dot, norm, Matrix};
use rand::Rng;
use rand_distr::StandardNormal;

/// Number of multiply-and-renormalize rounds.
pub const POWER_ITERATIONS: usize = 50;

/// Draw a random vector of standard-normal components, scaled to unit length.
///
/// Returns the zero vector in the (practically impossible) case that every
/// draw is zero.
pub fn random_unit_vector<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<f64> {
    let mut v: Vec<f64> = (0..n).map(|_| rng.sample(StandardNormal)).collect();
    let len = norm(&v);
    if len > 0.0 {
        for x in &mut v {
            *x /= len;
        }
    }
    v
}

/// Estimate the magnitude of the dominant eigenvalue of a square matrix.
///
/// Returns `0.0` when an iterate collapses to the zero vector (nilpotent or
/// all-zero matrix).
///
/// # Panics
/// Panics if the matrix is not square or `start` has the wrong length.
pub fn power_iteration(m: &Matrix, start: &[f64], iterations: usize) -> f64 {
    assert_eq!(m.rows(), m.cols(), "power iteration needs a square matrix");
    assert_eq!(start.len(), m.cols(), "start vector length mismatch");

    let mut v = start.to_vec();
    for _ in 0..iterations {
        let mut next = m.mul_vec(&v);
        let len = norm(&next);
        if len == 0.0 || !len.is_finite() {
            return 0.0;
        }
        for x in &mut next {
            *x /= len;
        }
        v = next;
    }

    let mv = m.mul_vec(&v);
    dot(&v, &mv).abs()
}

/// Outcome of [`rescale_to_radius`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rescale {
    /// Dominant eigenvalue magnitude before scaling.
    pub estimate: f64,
    /// Factor applied to every weight, `None` if the matrix was degenerate.
    pub factor: Option<f64>,
}

/// Rescale `m` in place so its estimated spectral radius equals `target`.
///
/// A degenerate matrix (estimate ≤ 0) is left untouched.
pub fn rescale_to_radius(m: &mut Matrix, target: f64, start: &[f64]) -> Rescale {
    let estimate = power_iteration(m, start, POWER_ITERATIONS);
    if estimate > 0.0 {
        let factor = target / estimate;
        m.scale(factor);
        Rescale {
            estimate,
            factor: Some(factor),
        }
    } else {
        Rescale {
            estimate,
            factor: None,
        }
    }
}
