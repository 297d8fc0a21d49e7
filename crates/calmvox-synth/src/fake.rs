//! Deterministic in-memory engine for tests.
//!
//! Records every transport call and lets the test decide when utterances
//! finish or fail, so session behavior can be checked without audio
//! hardware or a background runtime.

use std::sync::{Arc, Mutex};

use crate::engine::SynthesisEngine;
use crate::error::{SynthesisError, SynthesisResult};
use crate::types::{Utterance, UtteranceId, VoiceInfo};

/// One transport call observed by a [`FakeEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Speak {
        utterance_id: UtteranceId,
        text: String,
        voice_id: Option<String>,
        rate: f32,
    },
    Pause,
    Resume,
    Cancel,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<EngineCall>,
    active: Option<UtteranceId>,
    voices: Vec<VoiceInfo>,
    fail_next_speak: bool,
    fail_next_cancel: bool,
}

/// Shared view into a [`FakeEngine`] for assertions and outcome control.
///
/// The handle stays valid after the engine has been boxed and moved into a
/// session, which is exactly when tests need it.
#[derive(Clone)]
pub struct FakeEngineHandle {
    state: Arc<Mutex<FakeState>>,
}

impl FakeEngineHandle {
    /// Every transport call the engine has received, in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of `Speak` calls so far.
    pub fn speak_count(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Speak { .. }))
    }

    /// Number of `Cancel` calls so far.
    pub fn cancel_count(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Cancel))
    }

    /// Number of `Pause` calls so far.
    pub fn pause_count(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Pause))
    }

    /// Number of `Resume` calls so far.
    pub fn resume_count(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Resume))
    }

    /// The most recent `Speak` call, if any.
    pub fn last_speak(&self) -> Option<EngineCall> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .rev()
            .find(|c| matches!(c, EngineCall::Speak { .. }))
            .cloned()
    }

    /// Id of the utterance the engine currently considers active.
    pub fn active(&self) -> Option<UtteranceId> {
        self.state.lock().unwrap().active
    }

    /// Mark the active utterance as no longer playing and return its id.
    ///
    /// Call this before feeding a `Finished` or `Failed` event for the
    /// returned id, mirroring a real engine that stops producing audio
    /// before its event is observed.
    pub fn take_active(&self) -> Option<UtteranceId> {
        self.state.lock().unwrap().active.take()
    }

    /// Replace the voice list the engine reports from `voices()`.
    pub fn set_voices(&self, voices: Vec<VoiceInfo>) {
        self.state.lock().unwrap().voices = voices;
    }

    /// Make the next `speak` call return an error without going active.
    pub fn fail_next_speak(&self) {
        self.state.lock().unwrap().fail_next_speak = true;
    }

    /// Make the next `cancel` call return an error, leaving the active
    /// utterance in place the way a refusing engine would.
    pub fn fail_next_cancel(&self) {
        self.state.lock().unwrap().fail_next_cancel = true;
    }

    fn count(&self, pred: impl Fn(&EngineCall) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
    }
}

/// Synthesis engine that records transport calls instead of producing audio.
///
/// Rejects a `speak` while another utterance is active, so any session bug
/// that would overlap utterances fails the test immediately.
pub struct FakeEngine {
    state: Arc<Mutex<FakeState>>,
}

impl FakeEngine {
    /// Build an engine together with its recording handle.
    pub fn new() -> (Self, FakeEngineHandle) {
        let state = Arc::new(Mutex::new(FakeState::default()));
        let handle = FakeEngineHandle {
            state: Arc::clone(&state),
        };
        (Self { state }, handle)
    }
}

impl SynthesisEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        self.state.lock().unwrap().voices.clone()
    }

    fn speak(&mut self, utterance: Utterance) -> SynthesisResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Speak {
            utterance_id: utterance.id,
            text: utterance.text.clone(),
            voice_id: utterance.params.voice_id.clone(),
            rate: utterance.params.rate,
        });
        if state.fail_next_speak {
            state.fail_next_speak = false;
            return Err(SynthesisError::Synthesis("injected failure".to_string()));
        }
        if let Some(active) = state.active {
            return Err(SynthesisError::Synthesis(format!(
                "utterance {active} still active when {} was submitted",
                utterance.id
            )));
        }
        state.active = Some(utterance.id);
        Ok(())
    }

    fn pause(&mut self) -> SynthesisResult<()> {
        self.state.lock().unwrap().calls.push(EngineCall::Pause);
        Ok(())
    }

    fn resume(&mut self) -> SynthesisResult<()> {
        self.state.lock().unwrap().calls.push(EngineCall::Resume);
        Ok(())
    }

    fn cancel(&mut self) -> SynthesisResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Cancel);
        if state.fail_next_cancel {
            state.fail_next_cancel = false;
            return Err(SynthesisError::Synthesis(
                "injected cancel failure".to_string(),
            ));
        }
        state.active = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UtteranceParams;

    #[test]
    fn records_calls_in_order() {
        let (mut engine, handle) = FakeEngine::new();
        engine.speak(Utterance::new("hello", UtteranceParams::default())).unwrap();
        engine.pause().unwrap();
        engine.resume().unwrap();
        engine.cancel().unwrap();

        let calls = handle.calls();
        assert_eq!(calls.len(), 4);
        assert!(matches!(calls[0], EngineCall::Speak { .. }));
        assert_eq!(calls[1], EngineCall::Pause);
        assert_eq!(calls[2], EngineCall::Resume);
        assert_eq!(calls[3], EngineCall::Cancel);
    }

    #[test]
    fn rejects_overlapping_speak() {
        let (mut engine, _handle) = FakeEngine::new();
        engine.speak(Utterance::new("one", UtteranceParams::default())).unwrap();
        let err = engine.speak(Utterance::new("two", UtteranceParams::default()));
        assert!(err.is_err());
    }

    #[test]
    fn take_active_clears_the_slot() {
        let (mut engine, handle) = FakeEngine::new();
        engine.speak(Utterance::new("one", UtteranceParams::default())).unwrap();
        let id = handle.take_active().unwrap();
        assert_eq!(handle.active(), None);

        // A successor submission is accepted once the first is taken.
        engine.speak(Utterance::new("two", UtteranceParams::default())).unwrap();
        assert_ne!(handle.take_active().unwrap(), id);
    }

    #[test]
    fn injected_failure_does_not_go_active() {
        let (mut engine, handle) = FakeEngine::new();
        handle.fail_next_speak();
        assert!(engine.speak(Utterance::new("boom", UtteranceParams::default())).is_err());
        assert_eq!(handle.active(), None);
        assert_eq!(handle.speak_count(), 1);
    }

    #[test]
    fn injected_cancel_failure_keeps_active() {
        let (mut engine, handle) = FakeEngine::new();
        engine.speak(Utterance::new("one", UtteranceParams::default())).unwrap();
        handle.fail_next_cancel();

        assert!(engine.cancel().is_err());
        assert!(handle.active().is_some(), "refused cancel leaves the utterance playing");

        // The failure is one-shot.
        engine.cancel().unwrap();
        assert_eq!(handle.active(), None);
    }
}
