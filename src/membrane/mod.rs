//! Membrane layer: a P-system of typed objects, priority rules, and transport.
//!
//! - [`Object`]: typed value tokens carrying charge and mobility
//! - [`EvolutionRule`]: priority-ordered multiset rewriting rules
//! - [`Membrane`]: a single container that evolves, passes objects, and checks dissolution
//! - [`MembraneHierarchy`]: a binary tree of membranes driven in steps
//!
//! # Usage
//!
//! ```rust
//! use reservoir::membrane::{MembraneHierarchy, Object};
//!
//! let mut system = MembraneHierarchy::new(3);
//! system.inject_object("root", Object::new("negative_signal", 1.5, -1, 0.9))?;
//! system.inject_object("root", Object::new("positive_signal", 1.0, 1, 0.7))?;
//! system.run(3);
//!
//! let signals = system.collect_results();
//! # let _ = signals;
//! # Ok::<(), reservoir::ReservoirError>(())
//! ```

pub mod hierarchy;
#[allow(clippy::module_inception)]
pub mod membrane;
pub mod object;
pub mod rule;

pub use hierarchy::{MembraneHierarchy, StepSummary, ROOT_ID};
pub use membrane::{Membrane, MembraneId, CHARGE_BOOST, DISSOLUTION_THRESHOLD, PASS_THRESHOLD};
pub use object::{Object, NEGATIVE, NEUTRAL, POSITIVE};
pub use rule::{default_rules, EvolutionRule, MatchMode, Transform};
