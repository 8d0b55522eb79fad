//! The reservoir engine: a seeded echo state network with membrane-modulated decay.
//!
//! # Update pipeline
//!
//! ```text
//! a_i   = tanh(W_in[i]·u + W[i]·x) · (1 + 0.1·valence)
//! leak  = clamp(leak_rate · (1 + 0.2·attention), 0, 1)
//! x_i   = (1 - leak)·x_i + leak·a_i
//! decay: for each companion membrane m, with probability m.permeability:
//!        x *= 1 - 0.05·m.level
//! smooth: x_i -= 0.01·memory·(x_i - mean{x_j : W[i][j] ≠ 0})
//! ```
//!
//! # Concurrency
//!
//! Weights and state sit behind one `RwLock`. `update`, `reset`,
//! `set_input_weights` and training take it exclusively; `get_state`,
//! `predict`, `stats` and `snapshot` share it. The companion hierarchy is
//! immutable after construction and read without the lock.

use super::readout::{self, TrainingConfig, TrainingMode};
use crate::config::{PersonaTrait, ReservoirConfig, ReservoirParams};
use crate::error::{ReservoirError, Result};
use crate::kernel::{
    dot, power_iteration, random_unit_vector, rescale_to_radius, seed, Matrix, POWER_ITERATIONS,
};
use crate::membrane::MembraneHierarchy;
use parking_lot::RwLock;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Activation gain per unit of valence.
const VALENCE_GAIN: f64 = 0.1;
/// Leak-rate gain per unit of attention.
const ATTENTION_GAIN: f64 = 0.2;
/// State shrink per membrane level when a decay draw fires.
const LEVEL_DECAY: f64 = 0.05;
/// Neighbor-smoothing step per unit of memory.
const SMOOTHING_STEP: f64 = 0.01;

/// Counters and shapes describing an engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub reservoir_size: usize,
    /// `None` until the first update sizes the input weights.
    pub input_dim: Option<usize>,
    /// `None` until the readout has been trained.
    pub output_dim: Option<usize>,
    pub trained: bool,
    pub updates: u64,
    pub companion_membranes: usize,
}

/// Serializable copy of an engine's weights, state, and stream positions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub params: ReservoirParams,
    pub persona: PersonaTrait,
    pub seed: u64,
    pub input_weights: Option<Matrix>,
    pub reservoir_weights: Matrix,
    pub output_weights: Option<Matrix>,
    pub state: Vec<f64>,
    pub trained: bool,
    pub updates: u64,
    /// Word positions of the input-weight and decay streams.
    pub input_stream_pos: u128,
    pub decay_stream_pos: u128,
}

struct EngineState {
    input_weights: Option<Matrix>,
    reservoir_weights: Matrix,
    output_weights: Option<Matrix>,
    state: Vec<f64>,
    trained: bool,
    updates: u64,
    input_rng: ChaCha8Rng,
    decay_rng: ChaCha8Rng,
}

/// A deterministic echo state network.
///
/// Same params, persona, seed, and input sequence always give bit-identical
/// state trajectories.
///
/// # Example
///
/// ```rust
/// use reservoir::{PersonaTrait, ReservoirEngine, ReservoirParams};
///
/// let params = ReservoirParams { reservoir_size: 50, ..Default::default() };
/// let engine = ReservoirEngine::new(params, PersonaTrait::default(), 42)?;
///
/// engine.update(&[0.5, 0.3, 0.8])?;
/// let state = engine.get_state();
/// assert_eq!(state.len(), 50);
///
/// engine.train_output(&[state], &[vec![1.0]])?;
/// let prediction = engine.predict()?;
/// assert_eq!(prediction.len(), 1);
/// # Ok::<(), reservoir::ReservoirError>(())
/// ```
pub struct ReservoirEngine {
    params: ReservoirParams,
    persona: PersonaTrait,
    seed: u64,
    companion: MembraneHierarchy,
    inner: RwLock<EngineState>,
}

impl ReservoirEngine {
    /// Build an engine: sparse normal weights, spectral rescale, companion tree.
    pub fn new(params: ReservoirParams, persona: PersonaTrait, seed: u64) -> Result<Self> {
        params.validate()?;
        persona.validate()?;

        let n = params.reservoir_size;
        let mut weight_rng = seed::stream(seed, seed::RESERVOIR_WEIGHTS);
        let mut reservoir_weights = sparse_normal(n, params.sparsity, &mut weight_rng);
        let start = random_unit_vector(n, &mut weight_rng);
        let rescale = rescale_to_radius(&mut reservoir_weights, params.spectral_radius, &start);

        let companion = companion_for(&params, &persona);

        debug!(
            reservoir_size = n,
            connections = reservoir_weights.nnz(),
            eigenvalue_estimate = rescale.estimate,
            scaled = rescale.factor.is_some(),
            companion_membranes = companion.len(),
            "reservoir initialized"
        );

        Ok(Self {
            params,
            persona,
            seed,
            companion,
            inner: RwLock::new(EngineState {
                input_weights: None,
                reservoir_weights,
                output_weights: None,
                state: vec![0.0; n],
                trained: false,
                updates: 0,
                input_rng: seed::stream(seed, seed::INPUT_WEIGHTS),
                decay_rng: seed::stream(seed, seed::MEMBRANE_DECAY),
            }),
        })
    }

    /// Build from a [`ReservoirConfig`].
    pub fn from_config(config: &ReservoirConfig) -> Result<Self> {
        Self::new(config.params.clone(), config.persona.clone(), config.seed)
    }

    // --- Accessors ---

    pub fn params(&self) -> &ReservoirParams {
        &self.params
    }

    pub fn persona(&self) -> &PersonaTrait {
        &self.persona
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The rule-less membrane tree that drives the decay pass.
    ///
    /// Independent of any hierarchy a caller drives with its own objects.
    pub fn companion(&self) -> &MembraneHierarchy {
        &self.companion
    }

    /// Leak rate after persona scaling, clamped to [0, 1].
    pub fn effective_leak(&self) -> f64 {
        (self.params.leak_rate * (1.0 + ATTENTION_GAIN * self.persona.attention)).clamp(0.0, 1.0)
    }

    pub fn is_trained(&self) -> bool {
        self.inner.read().trained
    }

    // --- Core methods ---

    /// Re-draw input weights for `input_dim` inputs, discarding the old ones.
    ///
    /// Called automatically by the first [`update`](Self::update).
    pub fn set_input_weights(&self, input_dim: usize) -> Result<()> {
        if input_dim == 0 {
            return Err(ReservoirError::EmptyInput("input dimension is zero".into()));
        }
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        inner.input_weights = Some(self.draw_input_weights(input_dim, &mut inner.input_rng));
        Ok(())
    }

    fn draw_input_weights(&self, input_dim: usize, rng: &mut ChaCha8Rng) -> Matrix {
        let scale = self.params.input_scaling;
        Matrix::from_fn(self.params.reservoir_size, input_dim, |_, _| {
            (rng.gen::<f64>() * 2.0 - 1.0) * scale
        })
    }

    /// Advance the reservoir one step with `input`.
    ///
    /// The first call fixes the input dimensionality; later calls with a
    /// different length fail with `DimensionMismatch` and change nothing.
    pub fn update(&self, input: &[f64]) -> Result<()> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let input_weights = match inner.input_weights.take() {
            Some(w) => w,
            None if input.is_empty() => {
                return Err(ReservoirError::EmptyInput("input vector is empty".into()));
            }
            None => self.draw_input_weights(input.len(), &mut inner.input_rng),
        };
        if input.len() != input_weights.cols() {
            let expected = input_weights.cols();
            inner.input_weights = Some(input_weights);
            return Err(ReservoirError::DimensionMismatch {
                expected,
                got: input.len(),
            });
        }

        // Leaky-integrator step
        let gain = 1.0 + VALENCE_GAIN * self.persona.valence;
        let leak = self.effective_leak();
        let next: Vec<f64> = (0..inner.state.len())
            .map(|i| {
                let drive = dot(input_weights.row(i), input)
                    + dot(inner.reservoir_weights.row(i), &inner.state);
                let activation = drive.tanh() * gain;
                (1.0 - leak) * inner.state[i] + leak * activation
            })
            .collect();
        inner.state = next;
        inner.input_weights = Some(input_weights);

        // Membrane-modulated decay; firings compound
        let mut fired = 0usize;
        for membrane in self.companion.iter() {
            if inner.decay_rng.gen::<f64>() < membrane.permeability() {
                let factor = 1.0 - LEVEL_DECAY * membrane.level() as f64;
                for x in &mut inner.state {
                    *x *= factor;
                }
                fired += 1;
            }
        }

        // Neighbor smoothing, in place
        let step = SMOOTHING_STEP * self.persona.memory;
        let weights = &inner.reservoir_weights;
        let state = &mut inner.state;
        for i in 0..state.len() {
            let mut sum = 0.0;
            let mut count = 0usize;
            for (j, &w) in weights.row(i).iter().enumerate() {
                if w != 0.0 {
                    sum += state[j];
                    count += 1;
                }
            }
            if count > 0 {
                let mean = sum / count as f64;
                state[i] -= step * (state[i] - mean);
            }
        }

        inner.updates += 1;
        trace!(update = inner.updates, decay_firings = fired, "reservoir updated");
        Ok(())
    }

    /// Copy of the current state vector.
    pub fn get_state(&self) -> Vec<f64> {
        self.inner.read().state.clone()
    }

    /// Zero the state. Weights are untouched.
    pub fn reset(&self) {
        self.inner.write().state.fill(0.0);
    }

    /// Train the readout, resuming from existing output weights if any.
    pub fn train_output(&self, states: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<()> {
        self.train_with(states, targets, &TrainingConfig::default(), TrainingMode::Continue)
    }

    /// Train the readout from zero weights, discarding any previous training.
    pub fn train_from_scratch(&self, states: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<()> {
        self.train_with(states, targets, &TrainingConfig::default(), TrainingMode::FromScratch)
    }

    /// Train the readout with an explicit schedule and mode.
    ///
    /// Each state row must be `reservoir_size` wide. When resuming, the
    /// target width must match the existing readout.
    pub fn train_with(
        &self,
        states: &[Vec<f64>],
        targets: &[Vec<f64>],
        config: &TrainingConfig,
        mode: TrainingMode,
    ) -> Result<()> {
        let n = self.params.reservoir_size;
        let output_dim = readout::validate(states, targets, n)?;

        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let mut weights = match (mode, inner.output_weights.take()) {
            (TrainingMode::Continue, Some(w)) if w.rows() != output_dim => {
                let expected = w.rows();
                inner.output_weights = Some(w);
                return Err(ReservoirError::DimensionMismatch {
                    expected,
                    got: output_dim,
                });
            }
            (TrainingMode::Continue, Some(w)) => w,
            _ => Matrix::zeros(output_dim, n),
        };

        readout::fit(&mut weights, states, targets, self.params.ridge_param, config);
        inner.output_weights = Some(weights);
        inner.trained = true;

        debug!(
            samples = states.len(),
            outputs = output_dim,
            epochs = config.epochs,
            mode = ?mode,
            "readout trained"
        );
        Ok(())
    }

    /// Readout applied to the current state: one unbounded value per output.
    pub fn predict(&self) -> Result<Vec<f64>> {
        let inner = self.inner.read();
        if !inner.trained {
            return Err(ReservoirError::NotTrained);
        }
        let weights = inner
            .output_weights
            .as_ref()
            .ok_or(ReservoirError::UninitializedOutput)?;
        Ok(weights.mul_vec(&inner.state))
    }

    /// Fresh power-iteration estimate of the recurrent matrix's spectral radius.
    pub fn spectral_radius_estimate(&self) -> f64 {
        let mut rng = seed::stream(self.seed, seed::SPECTRAL_PROBE);
        let start = random_unit_vector(self.params.reservoir_size, &mut rng);
        power_iteration(&self.inner.read().reservoir_weights, &start, POWER_ITERATIONS)
    }

    pub fn stats(&self) -> EngineStats {
        let inner = self.inner.read();
        EngineStats {
            reservoir_size: self.params.reservoir_size,
            input_dim: inner.input_weights.as_ref().map(Matrix::cols),
            output_dim: inner.output_weights.as_ref().map(Matrix::rows),
            trained: inner.trained,
            updates: inner.updates,
            companion_membranes: self.companion.len(),
        }
    }

    // --- Persistence ---

    /// Export weights, state, and stream positions.
    pub fn snapshot(&self) -> EngineSnapshot {
        let inner = self.inner.read();
        EngineSnapshot {
            params: self.params.clone(),
            persona: self.persona.clone(),
            seed: self.seed,
            input_weights: inner.input_weights.clone(),
            reservoir_weights: inner.reservoir_weights.clone(),
            output_weights: inner.output_weights.clone(),
            state: inner.state.clone(),
            trained: inner.trained,
            updates: inner.updates,
            input_stream_pos: inner.input_rng.get_word_pos(),
            decay_stream_pos: inner.decay_rng.get_word_pos(),
        }
    }

    /// Restore an engine that continues exactly where the snapshot left off.
    ///
    /// Shapes are checked against `params.reservoir_size`; inconsistent
    /// snapshots fail with `InvalidParameter`.
    pub fn from_snapshot(snap: EngineSnapshot) -> Result<Self> {
        snap.params.validate()?;
        snap.persona.validate()?;

        let n = snap.params.reservoir_size;
        let shape_error = |what: &str| {
            ReservoirError::InvalidParameter(format!("snapshot {} has the wrong shape", what))
        };
        if snap.reservoir_weights.shape() != (n, n) {
            return Err(shape_error("reservoir weights"));
        }
        if snap.state.len() != n {
            return Err(shape_error("state"));
        }
        if let Some(w) = &snap.input_weights {
            if w.rows() != n || w.cols() == 0 {
                return Err(shape_error("input weights"));
            }
        }
        if let Some(w) = &snap.output_weights {
            if w.cols() != n || w.rows() == 0 {
                return Err(shape_error("output weights"));
            }
        }
        if snap.trained && snap.output_weights.is_none() {
            return Err(ReservoirError::InvalidParameter(
                "snapshot is trained but has no output weights".into(),
            ));
        }

        let mut input_rng = seed::stream(snap.seed, seed::INPUT_WEIGHTS);
        input_rng.set_word_pos(snap.input_stream_pos);
        let mut decay_rng = seed::stream(snap.seed, seed::MEMBRANE_DECAY);
        decay_rng.set_word_pos(snap.decay_stream_pos);

        let companion = companion_for(&snap.params, &snap.persona);
        Ok(Self {
            params: snap.params,
            persona: snap.persona,
            seed: snap.seed,
            companion,
            inner: RwLock::new(EngineState {
                input_weights: snap.input_weights,
                reservoir_weights: snap.reservoir_weights,
                output_weights: snap.output_weights,
                state: snap.state,
                trained: snap.trained,
                updates: snap.updates,
                input_rng,
                decay_rng,
            }),
        })
    }
}

impl std::fmt::Debug for ReservoirEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservoirEngine")
            .field("params", &self.params)
            .field("persona", &self.persona)
            .field("seed", &self.seed)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Each cell is standard normal with probability `sparsity`, else zero.
pub(crate) fn sparse_normal<R: Rng + ?Sized>(n: usize, sparsity: f64, rng: &mut R) -> Matrix {
    Matrix::from_fn(n, n, |_, _| {
        if rng.gen::<f64>() < sparsity {
            rng.sample(StandardNormal)
        } else {
            0.0
        }
    })
}

fn companion_for(params: &ReservoirParams, persona: &PersonaTrait) -> MembraneHierarchy {
    MembraneHierarchy::uniform(params.tree_depth, 0.5 + 0.5 * persona.arousal)
}
