//! Error types for sound generation.

use thiserror::Error;

use crate::engine::NodeId;

/// Result type for generator operations.
pub type FartResult<T> = Result<T, FartError>;

/// Errors that can occur while building, playing or tearing down a sound.
#[derive(Debug, Error)]
pub enum FartError {
    /// The audio context could not be started/unlocked.
    #[error("audio engine failed to start: {message}")]
    EngineStart {
        /// Reason reported by the engine.
        message: String,
    },

    /// The engine rejected an operation on the graph.
    #[error("audio engine failed to {operation}: {message}")]
    Engine {
        /// Operation that failed (e.g. "connect").
        operation: &'static str,
        /// Reason reported by the engine.
        message: String,
    },

    /// The node is not known to the engine, usually because it was already released.
    #[error("unknown or already released {0}")]
    UnknownNode(NodeId),

    /// Configuration failed validation.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// What is wrong with it.
        message: String,
    },

    /// Configuration or node options could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FartError {
    /// Creates an engine start error.
    pub fn engine_start(message: impl Into<String>) -> Self {
        Self::EngineStart {
            message: message.into(),
        }
    }

    /// Creates an engine operation error.
    pub fn engine(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Engine {
            operation,
            message: message.into(),
        }
    }

    /// Creates an invalid config error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
