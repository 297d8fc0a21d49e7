//! Narration session configuration.

use serde::{Deserialize, Serialize};

/// Lower bound for the speaking-rate multiplier.
pub const MIN_RATE: f32 = 0.25;
/// Upper bound for the speaking-rate multiplier.
pub const MAX_RATE: f32 = 4.0;

/// Narration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationConfig {
    /// Initial speaking-rate multiplier (1.0 is normal speed). Clamped to
    /// [`MIN_RATE`]..=[`MAX_RATE`] when the session starts.
    pub rate: f32,
    /// Voice pitch passed through to the engine (1.0 is normal).
    pub pitch: f32,
    /// Playback volume passed through to the engine (0.0 to 1.0).
    pub volume: f32,
    /// Language preferred by the automatic voice selection policy.
    pub preferred_language: String,
    /// Voice id to pin from the start, bypassing automatic selection.
    pub voice: Option<String>,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            preferred_language: "en".to_string(),
            voice: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_neutral_english() {
        let config = NarrationConfig::default();
        assert_eq!(config.rate, 1.0);
        assert_eq!(config.pitch, 1.0);
        assert_eq!(config.volume, 1.0);
        assert_eq!(config.preferred_language, "en");
        assert!(config.voice.is_none());
    }

    #[test]
    fn rate_bounds_are_sane() {
        assert!(MIN_RATE > 0.0);
        assert!(MIN_RATE < 1.0 && 1.0 < MAX_RATE);
    }
}
