//! Seed derivation: one global seed, many independent random streams.
//!
//! Each purpose (reservoir weights, input weights, membrane decay draws) gets
//! its own ChaCha8 stream seeded from SHA-256 of (global_seed || label).
//! Streams never share state, so re-sizing the input weights does not shift
//! the decay draws of later updates.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Stream label for the recurrent weight matrix and its power-iteration start vector.
pub const RESERVOIR_WEIGHTS: &str = "reservoir_weights";
/// Stream label for input weight (re)sizing.
pub const INPUT_WEIGHTS: &str = "input_weights";
/// Stream label for the membrane-modulated decay draws.
pub const MEMBRANE_DECAY: &str = "membrane_decay";
/// Stream label for on-demand spectral radius estimates.
pub const SPECTRAL_PROBE: &str = "spectral_probe";

/// Derive a 64-bit sub-seed for `label` from the global seed.
pub fn derive_seed(global_seed: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(label.as_bytes());
    let hash = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash[0..8]);
    u64::from_le_bytes(bytes)
}

/// Create the deterministic RNG stream for `label`.
pub fn stream(global_seed: u64, label: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_seed(global_seed, label))
}
