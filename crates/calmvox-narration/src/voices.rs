//! Voice registry: discovered voices and the selection policy.

use calmvox_synth::{VoiceGender, VoiceInfo};
use tracing::debug;

use crate::error::NarrationError;

/// Tracks the voices an engine has reported and which one narration uses.
///
/// Engines load their voice lists asynchronously, so the registry starts
/// empty and recomputes its automatic pick on every refresh. Once a caller
/// pins a voice with [`select`](Self::select), refreshes stop overriding it;
/// an automatic pick never counts as pinned.
#[derive(Debug)]
pub struct VoiceRegistry {
    available: Vec<VoiceInfo>,
    selected: Option<VoiceInfo>,
    pinned: bool,
    preferred_language: String,
}

impl VoiceRegistry {
    pub fn new(preferred_language: impl Into<String>) -> Self {
        Self {
            available: Vec::new(),
            selected: None,
            pinned: false,
            preferred_language: preferred_language.into(),
        }
    }

    /// Replace the available voices with a fresh engine report.
    ///
    /// Recomputes the automatic selection unless a voice is pinned. A pinned
    /// voice is kept even if the new report no longer lists it, since it may
    /// reappear on the next refresh of a still-loading engine.
    pub fn refresh(&mut self, voices: Vec<VoiceInfo>) {
        self.available = voices;
        if !self.pinned {
            self.selected = default_voice(&self.available, &self.preferred_language).cloned();
            if let Some(voice) = &self.selected {
                debug!("Auto-selected voice '{}' ({})", voice.id, voice.language);
            }
        }
    }

    /// Pin the selection to the voice with the given id.
    pub fn select(&mut self, voice_id: &str) -> Result<(), NarrationError> {
        let voice = self
            .available
            .iter()
            .find(|v| v.id == voice_id)
            .cloned()
            .ok_or_else(|| NarrationError::VoiceNotFound(voice_id.to_string()))?;
        debug!("Pinned voice '{}'", voice.id);
        self.selected = Some(voice);
        self.pinned = true;
        Ok(())
    }

    /// Voices from the most recent engine report.
    pub fn available(&self) -> &[VoiceInfo] {
        &self.available
    }

    /// The voice narration will use, if any are known yet.
    pub fn selected(&self) -> Option<&VoiceInfo> {
        self.selected.as_ref()
    }

    /// True once a caller has pinned a voice explicitly.
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }
}

/// Automatic selection policy: a female voice in the preferred language,
/// else any voice in the preferred language, else the first voice offered.
pub fn default_voice<'a>(voices: &'a [VoiceInfo], language: &str) -> Option<&'a VoiceInfo> {
    voices
        .iter()
        .find(|v| matches_language(v, language) && is_female(v))
        .or_else(|| voices.iter().find(|v| matches_language(v, language)))
        .or_else(|| voices.first())
}

/// A bare language prefix matches all of its regional variants, so "en"
/// matches "en", "en-US" and "en_GB" but not "enm".
fn matches_language(voice: &VoiceInfo, language: &str) -> bool {
    match (
        voice.language.get(..language.len()),
        voice.language.get(language.len()..),
    ) {
        (Some(head), Some(rest)) => {
            head.eq_ignore_ascii_case(language)
                && (rest.is_empty() || rest.starts_with('-') || rest.starts_with('_'))
        }
        _ => false,
    }
}

/// Engines without structured gender data often encode it in the name.
fn is_female(voice: &VoiceInfo) -> bool {
    matches!(voice.gender, Some(VoiceGender::Female))
        || voice.name.to_ascii_lowercase().contains("female")
}
