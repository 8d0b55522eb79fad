//! Error types for the reservoir engine and membrane hierarchy.

use thiserror::Error;

/// Reservoir error types.
#[derive(Error, Debug)]
pub enum ReservoirError {
    /// Construction-time parameter outside its valid range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Input vector length disagrees with the established dimensionality
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Training states and targets have different sample counts
    #[error("Size mismatch: {states} states but {targets} targets")]
    SizeMismatch { states: usize, targets: usize },

    /// Empty input where non-empty was required
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Prediction requested before the readout was trained
    #[error("Network not trained")]
    NotTrained,

    /// Prediction requested but no output weights exist
    #[error("Output weights not initialized")]
    UninitializedOutput,

    /// No membrane with the given id
    #[error("Membrane not found: {0}")]
    NotFound(String),

    /// Object transport without a target membrane
    #[error("Target membrane is absent")]
    NilTarget,

    /// Config file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for reservoir operations.
pub type Result<T> = std::result::Result<T, ReservoirError>;
