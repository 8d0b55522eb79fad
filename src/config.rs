//! Engine configuration: reservoir hyper-parameters, persona traits, and seed.
//!
//! Every struct here is plain data with serde support. Missing JSON fields
//! fall back to the defaults, so a config file only needs to name the values
//! it changes:
//!
//! ```rust
//! use reservoir::ReservoirConfig;
//!
//! let config = ReservoirConfig::from_json(r#"{"seed": 7, "params": {"reservoir_size": 50}}"#)?;
//! assert_eq!(config.params.reservoir_size, 50);
//! assert_eq!(config.params.leak_rate, 0.3);
//! # Ok::<(), reservoir::ReservoirError>(())
//! ```

use crate::error::{ReservoirError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hyper-parameters of the echo state network.
///
/// Immutable once an engine has been built from them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservoirParams {
    /// Number of neurons in the reservoir layer.
    pub reservoir_size: usize,
    /// Target magnitude of the dominant eigenvalue, in (0, 1).
    pub spectral_radius: f64,
    /// Input weights are drawn uniformly from `[-input_scaling, input_scaling]`.
    pub input_scaling: f64,
    /// Leaky-integrator coefficient, in (0, 1].
    pub leak_rate: f64,
    /// Probability that a recurrent connection exists, in [0, 1].
    pub sparsity: f64,
    /// L2 penalty applied to the readout gradient.
    pub ridge_param: f64,
    /// Depth of the companion membrane tree, at most [`MAX_TREE_DEPTH`].
    pub tree_depth: usize,
}

/// Deepest companion tree accepted: 4095 membranes, lowest decay factor 0.45.
pub const MAX_TREE_DEPTH: usize = 12;

impl Default for ReservoirParams {
    fn default() -> Self {
        Self {
            reservoir_size: 100,
            spectral_radius: 0.95,
            input_scaling: 1.0,
            leak_rate: 0.3,
            sparsity: 0.1,
            ridge_param: 1e-8,
            tree_depth: 3,
        }
    }
}

impl ReservoirParams {
    /// Check every parameter against its valid range.
    pub fn validate(&self) -> Result<()> {
        if self.reservoir_size == 0 {
            return Err(invalid("reservoir size must be positive"));
        }
        if !(self.spectral_radius > 0.0 && self.spectral_radius < 1.0) {
            return Err(invalid(format!(
                "spectral radius must be in (0, 1), got {}",
                self.spectral_radius
            )));
        }
        if !(self.leak_rate > 0.0 && self.leak_rate <= 1.0) {
            return Err(invalid(format!(
                "leak rate must be in (0, 1], got {}",
                self.leak_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.sparsity) {
            return Err(invalid(format!(
                "sparsity must be in [0, 1], got {}",
                self.sparsity
            )));
        }
        if !(self.input_scaling.is_finite() && self.input_scaling >= 0.0) {
            return Err(invalid(format!(
                "input scaling must be finite and non-negative, got {}",
                self.input_scaling
            )));
        }
        if !(self.ridge_param.is_finite() && self.ridge_param >= 0.0) {
            return Err(invalid(format!(
                "ridge parameter must be finite and non-negative, got {}",
                self.ridge_param
            )));
        }
        if self.tree_depth > MAX_TREE_DEPTH {
            return Err(invalid(format!(
                "tree depth must be at most {}, got {}",
                MAX_TREE_DEPTH, self.tree_depth
            )));
        }
        Ok(())
    }
}

/// External personality modifiers that bias coefficients in both subsystems.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaTrait {
    /// Emotional tone, in [-1, 1]. Scales activations by `1 + 0.1 * valence`.
    pub valence: f64,
    /// Activation level, in [0, 1]. Sets companion membrane permeability.
    pub arousal: f64,
    pub dominance: f64,
    /// Focus, in [0, 1]. Scales the leak rate by `1 + 0.2 * attention`.
    pub attention: f64,
    /// Retention, in [0, 1]. Scales the neighbor smoothing coefficient.
    pub memory: f64,
    pub creativity: f64,
}

impl Default for PersonaTrait {
    fn default() -> Self {
        Self {
            valence: 0.2,
            arousal: 0.6,
            dominance: 0.5,
            attention: 0.8,
            memory: 0.7,
            creativity: 0.5,
        }
    }
}

impl PersonaTrait {
    /// A persona whose traits leave every coefficient at its base value.
    pub fn neutral() -> Self {
        Self {
            valence: 0.0,
            arousal: 0.0,
            dominance: 0.0,
            attention: 0.0,
            memory: 0.0,
            creativity: 0.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(-1.0..=1.0).contains(&self.valence) {
            return Err(invalid(format!(
                "valence must be in [-1, 1], got {}",
                self.valence
            )));
        }
        let unit = [
            ("arousal", self.arousal),
            ("dominance", self.dominance),
            ("attention", self.attention),
            ("memory", self.memory),
            ("creativity", self.creativity),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{} must be in [0, 1], got {}", name, value)));
            }
        }
        Ok(())
    }
}

/// Everything needed to build a [`ReservoirEngine`](crate::ReservoirEngine).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservoirConfig {
    pub params: ReservoirParams,
    pub persona: PersonaTrait,
    /// Global seed for weight initialization and stochastic decay.
    pub seed: u64,
}

impl ReservoirConfig {
    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Persist to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Validate params and persona together.
    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        self.persona.validate()
    }
}

fn invalid(msg: impl Into<String>) -> ReservoirError {
    ReservoirError::InvalidParameter(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ReservoirConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.params.reservoir_size, 100);
        assert_eq!(config.params.tree_depth, 3);
    }

    #[test]
    fn test_rejects_out_of_range_params() {
        let cases: Vec<Box<dyn Fn(&mut ReservoirParams)>> = vec![
            Box::new(|p| p.reservoir_size = 0),
            Box::new(|p| p.spectral_radius = 0.0),
            Box::new(|p| p.spectral_radius = 1.0),
            Box::new(|p| p.spectral_radius = f64::NAN),
            Box::new(|p| p.leak_rate = 0.0),
            Box::new(|p| p.leak_rate = 1.01),
            Box::new(|p| p.sparsity = 1.5),
            Box::new(|p| p.ridge_param = -1.0),
            Box::new(|p| p.tree_depth = MAX_TREE_DEPTH + 1),
        ];

        for mutate in cases {
            let mut params = ReservoirParams::default();
            mutate(&mut params);
            assert!(
                matches!(params.validate(), Err(ReservoirError::InvalidParameter(_))),
                "Expected InvalidParameter for {:?}",
                params
            );
        }
    }

    #[test]
    fn test_oversized_tree_depth_rejected_from_json() {
        let config = ReservoirConfig::from_json(r#"{"params": {"tree_depth": 64}}"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ReservoirError::InvalidParameter(_))
        ));

        let params = ReservoirParams {
            tree_depth: MAX_TREE_DEPTH,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_leak_rate_of_one_is_valid() {
        let params = ReservoirParams {
            leak_rate: 1.0,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_persona_ranges() {
        assert!(PersonaTrait::default().validate().is_ok());
        assert!(PersonaTrait::neutral().validate().is_ok());

        let persona = PersonaTrait {
            valence: -1.5,
            ..Default::default()
        };
        assert!(persona.validate().is_err());

        let persona = PersonaTrait {
            memory: 1.2,
            ..Default::default()
        };
        assert!(persona.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            ReservoirConfig::from_json(r#"{"params": {"leak_rate": 0.5}, "seed": 99}"#).unwrap();
        assert_eq!(config.params.leak_rate, 0.5);
        assert_eq!(config.params.reservoir_size, 100);
        assert_eq!(config.persona, PersonaTrait::default());
        assert_eq!(config.seed, 99);
    }

    #[test]
    fn test_file_round_trip() {
        let config = ReservoirConfig {
            seed: 1234,
            params: ReservoirParams {
                reservoir_size: 42,
                ..Default::default()
            },
            ..Default::default()
        };

        let path = std::env::temp_dir().join("reservoir_test_config.json");
        config.save(&path).expect("save failed");
        let loaded = ReservoirConfig::load(&path).expect("load failed");
        assert_eq!(config, loaded);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(matches!(
            ReservoirConfig::from_json("{not json"),
            Err(ReservoirError::Json(_))
        ));
    }
}
