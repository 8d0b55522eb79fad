//! Kernel layer: numeric foundations for the reservoir.
//!
//! - Dense row-major matrices and dot products ([`Matrix`])
//! - Power-iteration spectral-radius control ([`spectral`])
//! - Deterministic per-purpose RNG streams ([`seed`])
//!
//! This layer has no dependencies on [`membrane`](crate::membrane) or
//! [`esn`](crate::esn).

pub mod matrix;
pub mod seed;
pub mod spectral;

pub use matrix::{dot, norm, Matrix};
pub use spectral::{power_iteration, random_unit_vector, rescale_to_radius, Rescale, POWER_ITERATIONS};
