//! Synthesis engine trait and the events engines report

use crate::error::SynthesisResult;
use crate::types::{Utterance, UtteranceId, VoiceInfo};

/// Events a synthesis engine delivers on its event channel.
///
/// Playback outcomes always name the utterance they belong to, so a session
/// can discard events for utterances it has already moved past.
#[derive(Debug, Clone)]
pub enum SynthesisEvent {
    /// The engine's voice list became available or changed.
    VoicesChanged(Vec<VoiceInfo>),
    /// An utterance played to its natural end.
    Finished { utterance_id: UtteranceId },
    /// An utterance failed before completing.
    Failed {
        utterance_id: UtteranceId,
        error: String,
    },
    /// An utterance was cancelled before completing.
    Cancelled { utterance_id: UtteranceId },
}

/// Channel half engines send [`SynthesisEvent`]s on.
pub type EventSender = tokio::sync::mpsc::UnboundedSender<SynthesisEvent>;
/// Channel half the engine's driver receives events on.
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<SynthesisEvent>;

/// Transport-controllable speech synthesis engine.
///
/// The caller keeps at most one utterance active at a time: it cancels
/// before submitting a replacement and waits for a `Finished` event before
/// submitting a successor. Transport calls return synchronously; playback
/// outcomes arrive later as [`SynthesisEvent`]s.
pub trait SynthesisEngine: Send {
    /// Engine identifier for logs and status output.
    fn name(&self) -> &str;

    /// Voices currently known to the engine.
    ///
    /// May be empty until asynchronous voice discovery completes; a
    /// `VoicesChanged` event fires when it does.
    fn voices(&self) -> Vec<VoiceInfo>;

    /// Start speaking one utterance.
    fn speak(&mut self, utterance: Utterance) -> SynthesisResult<()>;

    /// Pause the active utterance in place, preserving it for `resume`.
    fn pause(&mut self) -> SynthesisResult<()>;

    /// Resume a previously paused utterance.
    fn resume(&mut self) -> SynthesisResult<()>;

    /// Cancel the active utterance, if any. Idle engines treat this as a
    /// no-op and report success.
    fn cancel(&mut self) -> SynthesisResult<()>;
}
