//! Error types for synthesis engines

use thiserror::Error;

/// Synthesis engine error types
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// The engine binary or subsystem is not present on this machine
    #[error("synthesis engine not available: {0}")]
    EngineNotAvailable(String),

    /// The requested voice is not known to the engine
    #[error("voice not found: {0}")]
    VoiceNotFound(String),

    /// The utterance text cannot be synthesized
    #[error("invalid text input: {0}")]
    InvalidInput(String),

    /// The engine rejected or failed a request
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    /// The operation is not supported on this platform
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Process or pipe error while driving the engine
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for synthesis operations
pub type SynthesisResult<T> = Result<T, SynthesisError>;
