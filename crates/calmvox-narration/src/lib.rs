//! Sentence-by-sentence narration over a pluggable synthesis engine.
//!
//! Text is segmented into sentences once, then a [`NarrationSession`] walks
//! the sequence by submitting one utterance at a time to a
//! [`calmvox_synth::SynthesisEngine`] and reacting to the events it reports.
//! All transitions are synchronous and single-threaded; the only
//! asynchronous input is the engine's event stream, which the caller feeds
//! in via [`NarrationSession::handle_synthesis_event`].

pub mod config;
pub mod error;
pub mod metrics;
pub mod segment;
pub mod session;
pub mod voices;

pub use config::{NarrationConfig, MAX_RATE, MIN_RATE};
pub use error::{NarrationError, NarrationResult};
pub use metrics::NarrationMetrics;
pub use segment::segment_sentences;
pub use session::{NarrationEvent, NarrationSession, PlaybackState};
pub use voices::{default_voice, VoiceRegistry};
