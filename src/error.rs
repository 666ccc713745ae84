//! Error types for the outer surfaces of the crate.
//!
//! Graph construction, phase classification and tick synthesis never fail:
//! their inputs are coerced instead. Errors only arise where the crate talks
//! to the outside world (configuration files, learning-rate validation, the
//! CLI).

use thiserror::Error;

/// Errors that can occur while loading configuration or driving training.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Configuration is structurally valid but semantically rejected.
    #[error("Invalid configuration: {detail}")]
    Config {
        /// Human-readable reason.
        detail: String,
    },

    /// Learning rate must be finite and strictly positive.
    #[error("Invalid learning rate {0}: must be finite and > 0")]
    InvalidLearningRate(f64),

    /// Speed multiplier must be finite and strictly positive.
    #[error("Invalid speed multiplier {0}: must be finite and > 0")]
    InvalidSpeed(f64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseToml(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    SerializeToml(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SceneError {
    /// Shorthand for a [`SceneError::Config`] with the given detail.
    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }
}

/// Result type for fallible crate operations.
pub type SceneResult<T> = Result<T, SceneError>;
