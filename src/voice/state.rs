//! Voice-session state shared with the UI.
//!
//! [`VoiceState`] is the single source of truth the surrounding UI reads to
//! render the microphone button, the transcription spinner, and the level
//! indicator. The recorder mutates it; the UI polls it.
//!
//! [`SharedVoiceState`] is a type alias for `Arc<Mutex<VoiceState>>` — cheap
//! to clone and safe to share across threads.

use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// VoiceState
// ---------------------------------------------------------------------------

/// One mutable record per voice session.
///
/// Invariant: `is_recording` and `is_transcribing` are never both true —
/// recording fully stops before transcription begins. `is_playing` is
/// independent; the recorder's `&mut self` methods keep playback serialized
/// with respect to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceState {
    /// Microphone is live and audio is accumulating.
    pub is_recording: bool,

    /// The finalized recording is being uploaded for transcription.
    pub is_transcribing: bool,

    /// A synthesized response is currently playing.
    pub is_playing: bool,

    /// Live input level in `[0.0, 1.0]`; `0.0` whenever not recording.
    pub audio_level: f32,
}

impl VoiceState {
    /// `true` while the session is recording or waiting on transcription.
    ///
    /// The UI uses this to disable the record trigger while busy.
    pub fn is_busy(&self) -> bool {
        self.is_recording || self.is_transcribing
    }
}

impl Default for VoiceState {
    fn default() -> Self {
        Self {
            is_recording: false,
            is_transcribing: false,
            is_playing: false,
            audio_level: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// SharedVoiceState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`VoiceState`].
///
/// Lock for a short critical section; do **not** hold the lock across
/// `.await` points.
pub type SharedVoiceState = Arc<Mutex<VoiceState>>;

/// Construct a new [`SharedVoiceState`] with everything idle.
pub fn new_shared_voice_state() -> SharedVoiceState {
    Arc::new(Mutex::new(VoiceState::default()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_fully_idle() {
        let state = VoiceState::default();
        assert!(!state.is_recording);
        assert!(!state.is_transcribing);
        assert!(!state.is_playing);
        assert_eq!(state.audio_level, 0.0);
        assert!(!state.is_busy());
    }

    #[test]
    fn recording_is_busy() {
        let state = VoiceState {
            is_recording: true,
            ..VoiceState::default()
        };
        assert!(state.is_busy());
    }

    #[test]
    fn transcribing_is_busy() {
        let state = VoiceState {
            is_transcribing: true,
            ..VoiceState::default()
        };
        assert!(state.is_busy());
    }

    #[test]
    fn playing_alone_is_not_busy() {
        let state = VoiceState {
            is_playing: true,
            ..VoiceState::default()
        };
        assert!(!state.is_busy());
    }

    #[test]
    fn shared_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedVoiceState>();
    }

    #[test]
    fn shared_state_can_be_cloned_and_mutated() {
        let state = new_shared_voice_state();
        let state2 = Arc::clone(&state);

        state.lock().unwrap().is_recording = true;
        assert!(state2.lock().unwrap().is_recording);
    }
}
