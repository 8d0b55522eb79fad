//! # Reservoir: seeded echo states with a membrane modulator
//!
//! An echo state network (ESN) whose state decays under a tree of membranes,
//! plus a standalone membrane P-system for typed signal objects. Both produce
//! auxiliary signals for a downstream classifier.
//!
//! ## Quick Start
//!
//! ```rust
//! use reservoir::{MembraneHierarchy, Object, PersonaTrait, ReservoirEngine, ReservoirParams};
//!
//! // Reservoir: deterministic for a given seed
//! let params = ReservoirParams { reservoir_size: 64, ..Default::default() };
//! let engine = ReservoirEngine::new(params, PersonaTrait::default(), 42)?;
//!
//! let mut states = Vec::new();
//! for features in [[0.9, 0.1, 0.7], [0.2, 0.8, 0.1]] {
//!     engine.update(&features)?;
//!     states.push(engine.get_state());
//! }
//! engine.train_output(&states, &[vec![1.0], vec![0.0]])?;
//! let score = engine.predict()?[0];
//!
//! // Membranes: inject signals, evolve, collect
//! let mut system = MembraneHierarchy::new(3);
//! system.inject_object("root_0", Object::new("negative_signal", 1.2, -1, 0.8))?;
//! system.run(3);
//! let results = system.collect_results();
//! # let _ = (score, results);
//! # Ok::<(), reservoir::ReservoirError>(())
//! ```
//!
//! ## Core Concepts
//!
//! - **Reservoir**: fixed random recurrent weights rescaled to a spectral radius
//! - **Readout**: the only trained layer, fitted by ridge-penalised SGD
//! - **Persona**: traits that bias gain, leak, decay, and smoothing
//! - **Membranes**: containers that rewrite objects by priority rules and
//!   pass them upward according to permeability
//! - **Seed**: one `u64` drives every random draw through labelled streams

pub mod config;
pub mod error;
pub mod esn;
pub mod kernel;
pub mod membrane;

// Re-exports for convenience
pub use config::{PersonaTrait, ReservoirConfig, ReservoirParams, MAX_TREE_DEPTH};
pub use error::{ReservoirError, Result};
pub use esn::{EngineSnapshot, EngineStats, ReservoirEngine, TrainingConfig, TrainingMode};
pub use kernel::Matrix;
pub use membrane::{
    default_rules, EvolutionRule, MatchMode, Membrane, MembraneHierarchy, MembraneId, Object,
    StepSummary,
};
