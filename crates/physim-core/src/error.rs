//! Error types for the simulation engine.

use thiserror::Error;

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors that can occur while setting up or running a simulation.
///
/// Stepping itself has no recoverable failure mode. Out-of-range buffer
/// access and schema mismatches are logic defects and panic instead.
#[derive(Error, Debug)]
pub enum SimError {
    /// The display surface could not be created.
    #[error("Failed to initialize display: {0}")]
    DisplayInit(String),

    /// Invalid configuration value or file.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// Create a display initialization error.
    pub fn display_init(msg: impl Into<String>) -> Self {
        Self::DisplayInit(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
