//! Error types for Unistream Core

use thiserror::Error;

/// Result type alias for adapter and player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced synchronously by the adapter layer.
///
/// Engine failures during playback are never returned here; they travel as
/// events through the player's event bus.
#[derive(Error, Debug)]
pub enum Error {
    // Lifecycle errors
    #[error("Tech already initialized: {0}")]
    AlreadyInitialized(&'static str),

    #[error("Tech destroyed: {0}")]
    TechDestroyed(&'static str),

    // Engine errors
    #[error("Engine construction failed: {0}")]
    Engine(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an engine construction error
    pub fn engine(msg: impl Into<String>) -> Self {
        Error::Engine(msg.into())
    }

    /// Returns the error code reported to hosts
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::AlreadyInitialized(_) => "ALREADY_INITIALIZED",
            Error::TechDestroyed(_) => "TECH_DESTROYED",
            Error::Engine(_) => "ENGINE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "JSON",
        }
    }
}
