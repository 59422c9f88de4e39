//! Error types for Colloquy

use thiserror::Error;

/// Result type alias for Colloquy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Colloquy
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Persisted transcript could not be parsed into an ordered turn sequence
    #[error("corrupt transcript: {0}")]
    CorruptTranscript(String),

    /// Model endpoint returned an unusable response
    #[error("model error: {0}")]
    Model(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
