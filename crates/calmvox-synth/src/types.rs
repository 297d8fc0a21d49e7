//! Core types for speech synthesis

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::next_utterance_id;

/// Identifier for one submitted utterance.
///
/// Ids are unique for the lifetime of the process, so an event carrying an
/// id can always be matched against (or distinguished from) the utterance a
/// session currently has in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtteranceId(pub u64);

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Voice gender as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceGender {
    Male,
    Female,
    Unknown,
}

/// Voice information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Unique voice identifier
    pub id: String,
    /// Human-readable voice name
    pub name: String,
    /// Language code (e.g., "en-US", "fr")
    pub language: String,
    /// Gender, if the engine reports one
    pub gender: Option<VoiceGender>,
    /// Additional engine-specific properties
    pub properties: HashMap<String, String>,
}

impl VoiceInfo {
    /// Build a voice with no extra properties.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        language: impl Into<String>,
        gender: Option<VoiceGender>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            language: language.into(),
            gender,
            properties: HashMap::new(),
        }
    }
}

/// Delivery parameters for a single utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct UtteranceParams {
    /// Voice to speak with; `None` lets the engine pick its own default.
    pub voice_id: Option<String>,
    /// Speaking rate multiplier (1.0 is normal speed).
    pub rate: f32,
    /// Voice pitch (1.0 is normal).
    pub pitch: f32,
    /// Volume (0.0 to 1.0).
    pub volume: f32,
}

impl Default for UtteranceParams {
    fn default() -> Self {
        Self {
            voice_id: None,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// One synthesis request: a single sentence plus its delivery parameters.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    pub params: UtteranceParams,
}

impl Utterance {
    /// Build an utterance with a freshly allocated id.
    pub fn new(text: impl Into<String>, params: UtteranceParams) -> Self {
        Self {
            id: next_utterance_id(),
            text: text.into(),
            params,
        }
    }
}
