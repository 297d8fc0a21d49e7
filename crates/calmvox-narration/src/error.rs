//! Error types for narration sessions.

use calmvox_synth::SynthesisError;
use thiserror::Error;

/// Narration error types
#[derive(Error, Debug)]
pub enum NarrationError {
    /// The synthesis engine rejected a transport request
    #[error("engine error: {0}")]
    Engine(#[from] SynthesisError),

    /// The requested voice is not present in the registry
    #[error("voice not found: {0}")]
    VoiceNotFound(String),
}

/// Result type for narration operations
pub type NarrationResult<T> = Result<T, NarrationError>;
