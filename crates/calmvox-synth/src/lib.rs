//! Speech synthesis abstraction layer for CalmVox
//!
//! Defines the transport-controllable engine trait a narration session
//! drives, the voice and utterance types engines consume, the events they
//! emit back, and a deterministic in-memory engine for tests.

use std::sync::atomic::{AtomicU64, Ordering};

pub mod engine;
pub mod error;
pub mod fake;
pub mod types;

pub use engine::{EventReceiver, EventSender, SynthesisEngine, SynthesisEvent};
pub use error::{SynthesisError, SynthesisResult};
pub use fake::{EngineCall, FakeEngine, FakeEngineHandle};
pub use types::{Utterance, UtteranceId, UtteranceParams, VoiceGender, VoiceInfo};

static UTTERANCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Produce a process-unique utterance id.
pub fn next_utterance_id() -> UtteranceId {
    UtteranceId(UTTERANCE_ID_COUNTER.fetch_add(1, Ordering::SeqCst))
}
