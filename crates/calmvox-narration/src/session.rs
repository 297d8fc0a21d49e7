//! Narration session state machine.
//!
//! Drives a synthesis engine one sentence at a time: submissions are
//! strictly sequential, at most one utterance is ever in flight, and every
//! operation that would conflict with the active utterance cancels it
//! before doing anything else. Transitions are synchronous; the caller
//! forwards engine events into [`NarrationSession::handle_synthesis_event`]
//! and reacts to the [`NarrationEvent`]s that come back.

use calmvox_synth::{
    SynthesisEngine, SynthesisEvent, Utterance, UtteranceId, UtteranceParams, VoiceInfo,
};
use tracing::{debug, error, warn};

use crate::config::{NarrationConfig, MAX_RATE, MIN_RATE};
use crate::error::NarrationResult;
use crate::metrics::NarrationMetrics;
use crate::segment::segment_sentences;
use crate::voices::VoiceRegistry;

/// Playback state of a narration session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing speaking; `play` starts from the current sentence.
    Idle,
    /// An utterance is with the engine.
    Playing,
    /// The active utterance is paused in place.
    Paused,
}

/// Progress notifications produced by session transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum NarrationEvent {
    /// Natural advancement moved the session to a new sentence.
    SentenceChanged { index: usize },
    /// The final sentence finished; the session reset to the start.
    Completed,
    /// An utterance failed; playback halted at `index` so `play` can retry
    /// the same sentence.
    Halted { index: usize, error: String },
}

/// One narration of a fixed text through one synthesis engine.
pub struct NarrationSession {
    engine: Box<dyn SynthesisEngine>,
    sentences: Vec<String>,
    index: usize,
    state: PlaybackState,
    rate: f32,
    pitch: f32,
    volume: f32,
    voices: VoiceRegistry,
    requested_voice: Option<String>,
    active: Option<UtteranceId>,
    metrics: NarrationMetrics,
}

impl NarrationSession {
    /// Build a session narrating `text` through `engine`.
    ///
    /// The sentence sequence is derived immediately and only changes via
    /// [`set_text`](Self::set_text). Voices are adopted from the engine's
    /// current report and kept fresh through `VoicesChanged` events.
    pub fn new(engine: Box<dyn SynthesisEngine>, text: &str, config: &NarrationConfig) -> Self {
        let mut voices = VoiceRegistry::new(config.preferred_language.as_str());
        voices.refresh(engine.voices());
        let sentences = segment_sentences(text);
        debug!(
            "Narration session over {} sentences via '{}' engine",
            sentences.len(),
            engine.name()
        );
        let mut session = Self {
            engine,
            sentences,
            index: 0,
            state: PlaybackState::Idle,
            rate: config.rate.clamp(MIN_RATE, MAX_RATE),
            pitch: config.pitch,
            volume: config.volume,
            voices,
            requested_voice: config.voice.clone(),
            active: None,
            metrics: NarrationMetrics::default(),
        };
        session.try_pin_requested();
        session
    }

    /// Start or resume playback.
    ///
    /// Resuming from pause continues the active utterance in place. In
    /// every other case the sentence at the current index is submitted,
    /// cancelling any stale utterance first. An empty sentence sequence
    /// completes immediately.
    pub fn play(&mut self) -> NarrationResult<Option<NarrationEvent>> {
        if self.sentences.is_empty() {
            debug!("Nothing to narrate, completing immediately");
            self.state = PlaybackState::Idle;
            self.metrics.sessions_completed += 1;
            return Ok(Some(NarrationEvent::Completed));
        }

        if self.state == PlaybackState::Paused && self.active.is_some() {
            self.engine.resume()?;
            self.state = PlaybackState::Playing;
            debug!("Resumed at sentence {}", self.index);
            return Ok(None);
        }
        // Paused with nothing active means a seek or voice/rate change
        // cancelled the utterance mid-pause; fall through to a fresh
        // submission rather than resuming into an empty engine.

        self.cancel_active()?;
        self.state = PlaybackState::Playing;
        self.submit_current()?;
        Ok(None)
    }

    /// Pause the active utterance in place. No-op unless playing.
    pub fn pause(&mut self) -> NarrationResult<()> {
        if self.state != PlaybackState::Playing {
            debug!("Pause ignored in {:?} state", self.state);
            return Ok(());
        }
        self.engine.pause()?;
        self.state = PlaybackState::Paused;
        debug!("Paused at sentence {}", self.index);
        Ok(())
    }

    /// Cancel all synthesis and reset to the start of the text.
    ///
    /// The engine cancel is unconditional: even an apparently idle session
    /// tells the engine to cancel, covering utterances the session may have
    /// lost track of across engine restarts.
    pub fn stop(&mut self) -> NarrationResult<()> {
        if let Some(id) = self.active.take() {
            debug!("Stopping with utterance {} in flight", id);
            self.metrics.utterances_cancelled += 1;
        }
        self.metrics.cancel_requests += 1;
        self.state = PlaybackState::Idle;
        self.index = 0;
        self.engine.cancel()?;
        Ok(())
    }

    /// Change the speaking rate, clamped to [`MIN_RATE`]..=[`MAX_RATE`].
    ///
    /// A playing session restarts the current sentence at the new rate;
    /// the engine cannot change rate mid-utterance. A rate that clamps to
    /// the current value leaves playback alone.
    pub fn set_rate(&mut self, rate: f32) -> NarrationResult<()> {
        if !rate.is_finite() {
            warn!("Ignoring non-finite rate {}", rate);
            return Ok(());
        }
        let clamped = rate.clamp(MIN_RATE, MAX_RATE);
        if clamped != rate {
            debug!("Rate {} clamped to {}", rate, clamped);
        }
        if clamped == self.rate {
            return Ok(());
        }
        self.rate = clamped;
        self.restart_current()
    }

    /// Pin the voice used for subsequent utterances.
    ///
    /// A playing session restarts the current sentence with the new voice.
    pub fn set_voice(&mut self, voice_id: &str) -> NarrationResult<()> {
        self.voices.select(voice_id)?;
        self.requested_voice = None;
        self.restart_current()
    }

    /// Move to `index`, clamping past-the-end requests to the last sentence.
    ///
    /// Cancels the in-flight utterance. A playing session starts speaking
    /// at the new position; a paused or idle session stays silent at it.
    pub fn seek_to_sentence(&mut self, index: usize) -> NarrationResult<()> {
        if self.sentences.is_empty() {
            debug!("Seek ignored: no sentences");
            return Ok(());
        }
        let clamped = index.min(self.sentences.len() - 1);
        if clamped != index {
            debug!("Seek to {} clamped to {}", index, clamped);
        }
        let was_playing = self.state == PlaybackState::Playing;
        self.cancel_active()?;
        self.index = clamped;
        if was_playing {
            self.submit_current()?;
        }
        Ok(())
    }

    /// Replace the narration text, stopping playback and re-deriving the
    /// sentence sequence from scratch.
    pub fn set_text(&mut self, text: &str) -> NarrationResult<()> {
        self.stop()?;
        self.sentences = segment_sentences(text);
        debug!("Text replaced: {} sentences", self.sentences.len());
        Ok(())
    }

    /// Feed one engine event into the state machine.
    ///
    /// This is the only advancement transition: natural completion of the
    /// active utterance moves the session to the next sentence or to the
    /// end of the text. Events naming an utterance that is no longer
    /// active (completions racing a cancel) are discarded.
    pub fn handle_synthesis_event(&mut self, event: SynthesisEvent) -> Option<NarrationEvent> {
        match event {
            SynthesisEvent::VoicesChanged(voices) => {
                debug!("Voice list refreshed: {} voices", voices.len());
                self.voices.refresh(voices);
                self.try_pin_requested();
                None
            }
            SynthesisEvent::Finished { utterance_id } => self.on_finished(utterance_id),
            SynthesisEvent::Failed {
                utterance_id,
                error,
            } => self.on_failed(utterance_id, error),
            SynthesisEvent::Cancelled { utterance_id } => {
                debug!("Utterance {} reported cancelled", utterance_id);
                None
            }
        }
    }

    /// Playback state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// True while an utterance is active or paused.
    pub fn is_playing(&self) -> bool {
        self.state != PlaybackState::Idle
    }

    /// True while paused in the middle of a sentence.
    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    /// Index of the sentence the session is at.
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Sentence the session is at, if the text had any.
    pub fn current_sentence(&self) -> Option<&str> {
        self.sentences.get(self.index).map(String::as_str)
    }

    /// The segmented sentences, in narration order.
    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    /// Number of sentences in the text.
    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    /// Current speaking-rate multiplier.
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// The voice subsequent utterances will use, if any are known.
    pub fn selected_voice(&self) -> Option<&VoiceInfo> {
        self.voices.selected()
    }

    /// Voices from the engine's most recent report.
    pub fn available_voices(&self) -> &[VoiceInfo] {
        self.voices.available()
    }

    /// Counter snapshot.
    pub fn metrics(&self) -> NarrationMetrics {
        self.metrics
    }

    fn on_finished(&mut self, utterance_id: UtteranceId) -> Option<NarrationEvent> {
        if self.active != Some(utterance_id) {
            debug!("Ignoring stale completion for utterance {}", utterance_id);
            return None;
        }
        if self.state == PlaybackState::Paused {
            // Completion raced the pause request. Hold position so the
            // session does not advance while the user believes it is paused.
            debug!(
                "Utterance {} finished while paused; holding at sentence {}",
                utterance_id, self.index
            );
            return None;
        }
        self.active = None;
        self.metrics.utterances_finished += 1;
        self.advance()
    }

    fn on_failed(&mut self, utterance_id: UtteranceId, error: String) -> Option<NarrationEvent> {
        if self.active != Some(utterance_id) {
            debug!("Ignoring stale failure for utterance {}", utterance_id);
            return None;
        }
        error!(
            "Utterance {} failed at sentence {}: {}",
            utterance_id, self.index, error
        );
        self.active = None;
        self.metrics.utterances_failed += 1;
        // Index stays put so `play` retries the failed sentence.
        self.state = PlaybackState::Idle;
        Some(NarrationEvent::Halted {
            index: self.index,
            error,
        })
    }

    /// Move past a finished sentence: submit the next one or wrap up.
    fn advance(&mut self) -> Option<NarrationEvent> {
        self.index += 1;
        if self.index >= self.sentences.len() {
            debug!("Narration complete after {} sentences", self.sentences.len());
            self.index = 0;
            self.state = PlaybackState::Idle;
            self.metrics.sessions_completed += 1;
            return Some(NarrationEvent::Completed);
        }
        match self.submit_current() {
            Ok(()) => Some(NarrationEvent::SentenceChanged { index: self.index }),
            Err(e) => Some(NarrationEvent::Halted {
                index: self.index,
                error: e.to_string(),
            }),
        }
    }

    /// Submit the sentence at the current index as a fresh utterance.
    ///
    /// Callers guarantee no utterance is active and the index is in bounds.
    fn submit_current(&mut self) -> NarrationResult<()> {
        let text = self.sentences[self.index].clone();
        let utterance = Utterance::new(text, self.current_params());
        let id = utterance.id;
        debug!("Submitting sentence {} as utterance {}", self.index, id);
        match self.engine.speak(utterance) {
            Ok(()) => {
                self.active = Some(id);
                self.metrics.utterances_submitted += 1;
                Ok(())
            }
            Err(e) => {
                error!("Failed to submit sentence {}: {}", self.index, e);
                self.state = PlaybackState::Idle;
                self.active = None;
                Err(e.into())
            }
        }
    }

    fn current_params(&self) -> UtteranceParams {
        UtteranceParams {
            voice_id: self.voices.selected().map(|v| v.id.clone()),
            rate: self.rate,
            pitch: self.pitch,
            volume: self.volume,
        }
    }

    fn cancel_active(&mut self) -> NarrationResult<()> {
        if let Some(id) = self.active.take() {
            debug!("Cancelling utterance {}", id);
            self.metrics.utterances_cancelled += 1;
            self.metrics.cancel_requests += 1;
            if let Err(e) = self.engine.cancel() {
                // The utterance is untracked now, so the session must not
                // look alive waiting for events it will discard as stale.
                error!("Failed to cancel utterance {}: {}", id, e);
                self.state = PlaybackState::Idle;
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Restart the current sentence so new parameters take effect.
    ///
    /// The engine cannot change rate or voice mid-utterance. Playing
    /// sessions resubmit immediately; paused sessions drop the stale
    /// utterance so `play` restarts the sentence instead of resuming
    /// old-parameter audio. Idle sessions have nothing to restart.
    fn restart_current(&mut self) -> NarrationResult<()> {
        match self.state {
            PlaybackState::Playing => {
                self.cancel_active()?;
                self.submit_current()
            }
            PlaybackState::Paused => self.cancel_active(),
            PlaybackState::Idle => Ok(()),
        }
    }

    /// Apply a configured voice pin once the engine reports that voice.
    fn try_pin_requested(&mut self) {
        if let Some(id) = self.requested_voice.clone() {
            match self.voices.select(&id) {
                Ok(()) => self.requested_voice = None,
                Err(_) => debug!("Requested voice '{}' not reported yet", id),
            }
        }
    }
}

impl Drop for NarrationSession {
    fn drop(&mut self) {
        if let Err(e) = self.engine.cancel() {
            warn!("Engine cancel during teardown failed: {}", e);
        }
    }
}
