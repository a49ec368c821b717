//! Error types for the repsense workspace.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Phase thresholds inverted: down ({down}) must be strictly below up ({up})")]
    InvertedThresholds { down: f64, up: f64 },

    #[error("Invalid stability window: need at least 1 frame, got {0}")]
    InvalidStabilityWindow(u32),

    #[error("Invalid confidence threshold {0}: expected a value in [0, 1]")]
    InvalidConfidence(f32),

    #[error("Threshold {name} = {value} outside [0, 180] degrees")]
    ThresholdOutOfRange { name: &'static str, value: f64 },

    #[error("Workout session already finished")]
    SessionFinished,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
