//! Remote speech services — transcription upload and synthesis playback.
//!
//! Two thin HTTP clients behind async traits, plus the local playback path:
//!
//! ```text
//! RecordingBuffer ──finalize_wav()──▶ TranscriptionClient ──▶ text
//!
//! text ──▶ SpeechSynthesizer ──▶ encoded payload ──▶ playback::play_bytes
//!                                                      (symphonia → cpal)
//! ```
//!
//! Both clients classify failures the same way: transport error, timeout, or
//! non-success status — never a panic across the boundary.

pub mod playback;
pub mod synth;
pub mod transcribe;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use playback::{decode_audio, play_bytes, DecodedAudio, PlaybackError};
pub use synth::{HttpSynthesizer, SpeechSynthesizer, SynthesisError};
pub use transcribe::{HttpTranscriber, TranscriptionClient, TranscriptionError};

// test-only re-exports so sibling test modules can import the mocks without
// spelling the full paths.
#[cfg(test)]
pub use synth::MockSynthesizer;
#[cfg(test)]
pub use transcribe::MockTranscriber;
