//! Echo state network layer.
//!
//! - [`ReservoirEngine`]: seeded reservoir with leaky updates and decay
//! - [`readout`]: ridge SGD for the linear output layer
//!
//! Only the readout is ever trained. Input and recurrent weights are drawn
//! once from the engine's seed and stay fixed (apart from an explicit
//! [`ReservoirEngine::set_input_weights`] resize).

pub mod engine;
pub mod readout;

pub use engine::{EngineSnapshot, EngineStats, ReservoirEngine};
pub use readout::{TrainingConfig, TrainingMode, DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE};
