//! Readout training: ridge-penalised stochastic gradient descent.
//!
//! For every epoch and every sample `(s, t)`:
//!
//! ```text
//! y     = W · s
//! e     = y - t
//! W_ij -= lr · (e_i · s_j + λ · W_ij)
//! ```
//!
//! Only the readout `W` is trained; reservoir and input weights stay fixed.

use crate::error::{ReservoirError, Result};
use crate::kernel::{dot, Matrix};
use serde::{Deserialize, Serialize};

/// Full passes over the training set.
pub const DEFAULT_EPOCHS: usize = 100;
/// Fixed SGD step size.
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

/// SGD schedule for the readout.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub learning_rate: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

/// Whether training starts from the existing readout or from zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingMode {
    /// Resume from the current output weights (zero if none exist yet).
    #[default]
    Continue,
    /// Discard any existing output weights and start from zero.
    FromScratch,
}

/// Check a training set and return its output dimensionality.
///
/// Errors, in order: sample counts differ (`SizeMismatch`), no samples
/// (`EmptyInput`), a state row is not `state_dim` wide or target rows are
/// ragged (`DimensionMismatch`), target rows are empty (`EmptyInput`).
pub fn validate(states: &[Vec<f64>], targets: &[Vec<f64>], state_dim: usize) -> Result<usize> {
    if states.len() != targets.len() {
        return Err(ReservoirError::SizeMismatch {
            states: states.len(),
            targets: targets.len(),
        });
    }
    if states.is_empty() {
        return Err(ReservoirError::EmptyInput("no training data provided".into()));
    }

    if let Some(row) = states.iter().find(|s| s.len() != state_dim) {
        return Err(ReservoirError::DimensionMismatch {
            expected: state_dim,
            got: row.len(),
        });
    }

    let output_dim = targets[0].len();
    if output_dim == 0 {
        return Err(ReservoirError::EmptyInput("target rows are empty".into()));
    }
    if let Some(row) = targets.iter().find(|t| t.len() != output_dim) {
        return Err(ReservoirError::DimensionMismatch {
            expected: output_dim,
            got: row.len(),
        });
    }

    Ok(output_dim)
}

/// Run SGD on `weights` (`output_dim × state_dim`) in place.
///
/// Inputs must already have passed [`validate`].
pub fn fit(
    weights: &mut Matrix,
    states: &[Vec<f64>],
    targets: &[Vec<f64>],
    ridge: f64,
    config: &TrainingConfig,
) {
    let lr = config.learning_rate;
    let mut errors = vec![0.0; weights.rows()];

    for _ in 0..config.epochs {
        for (state, target) in states.iter().zip(targets) {
            // Forward pass for every output before any weight moves
            for (i, e) in errors.iter_mut().enumerate() {
                *e = dot(weights.row(i), state) - target[i];
            }

            for (i, &e) in errors.iter().enumerate() {
                for (w, &s) in weights.row_mut(i).iter_mut().zip(state) {
                    let gradient = e * s + ridge * *w;
                    *w -= lr * gradient;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_order() {
        let one = vec![vec![0.0; 3]];
        let two = vec![vec![0.0; 3], vec![0.0; 3]];

        assert!(matches!(
            validate(&one, &two, 3),
            Err(ReservoirError::SizeMismatch { states: 1, targets: 2 })
        ));
        assert!(matches!(validate(&[], &[], 3), Err(ReservoirError::EmptyInput(_))));
        assert!(matches!(
            validate(&one, &[vec![1.0]], 4),
            Err(ReservoirError::DimensionMismatch { expected: 4, got: 3 })
        ));
        assert!(matches!(
            validate(&two, &[vec![1.0], vec![1.0, 2.0]], 3),
            Err(ReservoirError::DimensionMismatch { expected: 1, got: 2 })
        ));
        assert!(matches!(
            validate(&one, &[vec![]], 3),
            Err(ReservoirError::EmptyInput(_))
        ));
        assert_eq!(validate(&one, &[vec![1.0, 0.0]], 3).unwrap(), 2);
    }

    #[test]
    fn test_fit_learns_linear_map() {
        // Target is 2 * first feature
        let states: Vec<Vec<f64>> = (0..20)
            .map(|k| {
                let x = k as f64 / 20.0;
                vec![x, 1.0 - x]
            })
            .collect();
        let targets: Vec<Vec<f64>> = states.iter().map(|s| vec![2.0 * s[0]]).collect();

        let mut weights = Matrix::zeros(1, 2);
        let config = TrainingConfig {
            epochs: 2000,
            learning_rate: 0.05,
        };
        fit(&mut weights, &states, &targets, 0.0, &config);

        assert!(
            (weights.get(0, 0) - 2.0).abs() < 0.05,
            "Expected w0 ≈ 2, got {}",
            weights.get(0, 0)
        );
        assert!(weights.get(0, 1).abs() < 0.05, "Expected w1 ≈ 0, got {}", weights.get(0, 1));
    }

    #[test]
    fn test_ridge_shrinks_weights() {
        let states = vec![vec![1.0]];
        let targets = vec![vec![1.0]];

        let mut plain = Matrix::zeros(1, 1);
        let mut ridged = Matrix::zeros(1, 1);
        fit(&mut plain, &states, &targets, 0.0, &TrainingConfig::default());
        fit(&mut ridged, &states, &targets, 1.0, &TrainingConfig::default());

        assert!(ridged.get(0, 0) < plain.get(0, 0));
    }

    #[test]
    fn test_zero_epochs_is_noop() {
        let mut weights = Matrix::zeros(1, 2);
        let config = TrainingConfig {
            epochs: 0,
            ..Default::default()
        };
        fit(&mut weights, &[vec![1.0, 1.0]], &[vec![1.0]], 0.0, &config);
        assert!(weights.is_zero());
    }
}
