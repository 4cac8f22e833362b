//! Voice interaction — microphone recording, live level, transcription
//! round-trip, and response playback.
//!
//! # Architecture
//!
//! ```text
//! start()                       stop()
//!   │                             │
//!   ▼                             ▼
//! capture thread (cpal) ──▶ RecordingBuffer ──finalize──▶ WAV blob
//!   │                                                       │
//!   └─ chunk RMS ──▶ level-monitor task ──▶ audio_level     ▼
//!                                              TranscriptionClient ──▶ text
//!
//! play_response(text) ──▶ SpeechSynthesizer ──▶ playback (blocking pool)
//! ```
//!
//! The UI reads [`VoiceState`] through [`SharedVoiceState`] and drives the
//! session through [`VoiceRecorder`].

pub mod recorder;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use recorder::{VoiceError, VoiceRecorder};
pub use state::{new_shared_voice_state, SharedVoiceState, VoiceState};
