//! Voice recorder — drives the record → transcribe → respond loop.
//!
//! [`VoiceRecorder`] owns the microphone session and the shared
//! [`VoiceState`]. The state machine is:
//!
//! ```text
//! Idle ──start()──▶ Recording ──stop()──▶ Transcribing ──▶ Idle
//!                       │
//!                       └─ level-monitor task publishes audio_level
//!                          at a fixed cadence until recording ends
//! ```
//!
//! The cpal stream lives on a dedicated capture thread so the recorder stays
//! `Send`; the thread accumulates chunks into the session buffer, records
//! each chunk's RMS for the monitor, and finalizes the WAV blob when told to
//! stop. Recording is therefore fully stopped — monitor cancelled, session
//! released, buffer immutable — before the upload starts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

use crate::audio::{rms, AudioCapture, LevelMeter, RecordingBuffer};
use crate::config::AudioConfig;
use crate::device::{AudioConstraints, DeviceError};
use crate::speech::{
    play_bytes, PlaybackError, SpeechSynthesizer, SynthesisError, TranscriptionClient,
    TranscriptionError,
};

use super::state::{new_shared_voice_state, SharedVoiceState};

/// How long the capture thread waits for a chunk before re-checking the stop
/// flag.
const CAPTURE_POLL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// VoiceError
// ---------------------------------------------------------------------------

/// Failures surfaced by the voice session, one variant per boundary.
#[derive(Debug, Error)]
pub enum VoiceError {
    /// Microphone acquisition failed; recording never started.
    #[error("microphone unavailable: {0}")]
    Microphone(#[from] DeviceError),

    /// The transcription upload failed. Retryable — the session is idle
    /// again.
    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    /// Fetching synthesized speech failed.
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// Decoding or playing the synthesized response failed.
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// Internal error (e.g. a task join failure).
    #[error("internal error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// ActiveRecording
// ---------------------------------------------------------------------------

/// Resources held only while recording is in progress.
struct ActiveRecording {
    /// Tells the capture thread to finalize and exit.
    stop_flag: Arc<AtomicBool>,
    /// Capture thread; joins to the finalized WAV blob (`None` = no audio).
    capture: std::thread::JoinHandle<Option<Vec<u8>>>,
    /// Level-monitor task; exits once `is_recording` clears.
    monitor: tokio::task::JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// VoiceRecorder
// ---------------------------------------------------------------------------

/// Owns one voice session: microphone, level signal, transcription and
/// response playback.
///
/// The `&mut self` operations serialize everything the UI can trigger; at
/// most one recording and one playback are in flight at any time.
pub struct VoiceRecorder {
    state: SharedVoiceState,
    transcriber: Arc<dyn TranscriptionClient>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    config: AudioConfig,
    active: Option<ActiveRecording>,
}

impl VoiceRecorder {
    /// Create an idle recorder.
    pub fn new(
        transcriber: Arc<dyn TranscriptionClient>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        config: AudioConfig,
    ) -> Self {
        Self {
            state: new_shared_voice_state(),
            transcriber,
            synthesizer,
            config,
            active: None,
        }
    }

    /// Shared state handle for the UI to poll.
    pub fn shared_state(&self) -> SharedVoiceState {
        Arc::clone(&self.state)
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Acquire the microphone and start recording.
    ///
    /// Idempotent while recording — a second call is a logged no-op. On
    /// acquisition failure the session never enters the recording state and
    /// [`VoiceError::Microphone`] is returned.
    pub async fn start(&mut self) -> Result<(), VoiceError> {
        if self.active.is_some() {
            log::warn!("voice: start() while already recording — ignored");
            return Ok(());
        }

        let stop_flag = Arc::new(AtomicBool::new(false));
        let level_cell = Arc::new(Mutex::new(0.0_f32));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), DeviceError>>();

        let constraints = AudioConstraints {
            sample_rate: self.config.sample_rate,
        };
        let thread_stop = Arc::clone(&stop_flag);
        let thread_level = Arc::clone(&level_cell);

        let capture = std::thread::spawn(move || {
            capture_thread(constraints, thread_level, thread_stop, ready_tx)
        });

        // The thread reports acquisition success/failure before any audio
        // flows; recv on the blocking pool so the runtime is not stalled.
        let ready = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .map_err(|e| VoiceError::Internal(e.to_string()))?
            .map_err(|e| VoiceError::Internal(e.to_string()))?;

        if let Err(e) = ready {
            let _ = capture.join();
            log::error!("voice: microphone acquisition failed: {e}");
            return Err(VoiceError::Microphone(e));
        }

        {
            let mut st = self.state.lock().unwrap();
            st.is_recording = true;
            st.audio_level = 0.0;
        }

        let monitor = self.spawn_level_monitor(level_cell);

        self.active = Some(ActiveRecording {
            stop_flag,
            capture,
            monitor,
        });

        log::debug!("voice: recording started");
        Ok(())
    }

    /// Stop recording, transcribe the take, and return the recognized text.
    ///
    /// Resolves exactly once per call:
    /// - `Ok(Some(text))` — transcription succeeded with non-empty text;
    /// - `Ok(None)` — never started, or nothing was captured, or the
    ///   endpoint recognized nothing;
    /// - `Err(VoiceError::Transcription)` — the upload failed; the session
    ///   is idle and retryable.
    pub async fn stop(&mut self) -> Result<Option<String>, VoiceError> {
        let Some(active) = self.active.take() else {
            return Ok(None);
        };

        // Leave the recording state first so the monitor loop observes the
        // flag and exits before the session is torn down.
        self.state.lock().unwrap().is_recording = false;
        let _ = active.monitor.await;

        active.stop_flag.store(true, Ordering::Relaxed);
        let wav = tokio::task::spawn_blocking(move || active.capture.join())
            .await
            .map_err(|e| VoiceError::Internal(e.to_string()))?
            .map_err(|_| VoiceError::Internal("capture thread panicked".into()))?;

        self.state.lock().unwrap().audio_level = 0.0;

        let Some(wav) = wav else {
            log::warn!("voice: nothing captured this session");
            return Ok(None);
        };

        log::debug!("voice: uploading {} bytes for transcription", wav.len());
        self.run_transcription(wav).await
    }

    /// Best-effort teardown for the unmount path.
    ///
    /// Stops any in-progress recording, discards the take without
    /// transcribing, and resets the shared state. Safe in any state.
    pub fn cleanup(&mut self) {
        if let Some(active) = self.active.take() {
            active.stop_flag.store(true, Ordering::Relaxed);
            active.monitor.abort();
            let _ = active.capture.join(); // discard the finalized take
            log::debug!("voice: session cleaned up, recording discarded");
        }
        *self.state.lock().unwrap() = Default::default();
    }

    /// Upload a finalized take; owns the `is_transcribing` flag transitions.
    async fn run_transcription(&self, wav: Vec<u8>) -> Result<Option<String>, VoiceError> {
        self.state.lock().unwrap().is_transcribing = true;
        let result = self.transcriber.transcribe(wav).await;
        self.state.lock().unwrap().is_transcribing = false;

        match result {
            Ok(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(text))
                }
            }
            Err(e) => {
                log::error!("voice: transcription failed: {e}");
                Err(e.into())
            }
        }
    }

    fn spawn_level_monitor(&self, level_cell: Arc<Mutex<f32>>) -> tokio::task::JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let meter = LevelMeter::new(self.config.level_ceiling);
        let period = Duration::from_millis(self.config.level_interval_ms.max(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let mut st = state.lock().unwrap();
                if !st.is_recording {
                    break;
                }
                let raw = *level_cell.lock().unwrap();
                st.audio_level = meter.normalize(raw);
            }
        })
    }

    // -----------------------------------------------------------------------
    // Playback
    // -----------------------------------------------------------------------

    /// Fetch synthesized speech for `text` and play it to completion.
    ///
    /// `is_playing` is set for the full duration and cleared on every exit
    /// path. Playback runs on the blocking pool; the stream handle is
    /// released when it finishes or fails.
    pub async fn play_response(&mut self, text: &str) -> Result<(), VoiceError> {
        self.state.lock().unwrap().is_playing = true;
        let result = self.play_response_inner(text).await;
        self.state.lock().unwrap().is_playing = false;

        if let Err(e) = &result {
            log::error!("voice: response playback failed: {e}");
        }
        result
    }

    async fn play_response_inner(&self, text: &str) -> Result<(), VoiceError> {
        let payload = self.synthesizer.synthesize(text).await?;

        tokio::task::spawn_blocking(move || play_bytes(payload))
            .await
            .map_err(|e| VoiceError::Internal(e.to_string()))?
            .map_err(VoiceError::from)
    }
}

impl Drop for VoiceRecorder {
    fn drop(&mut self) {
        self.cleanup();
    }
}

// ---------------------------------------------------------------------------
// Capture thread
// ---------------------------------------------------------------------------

/// Owns the cpal stream for one recording session.
///
/// Reports acquisition through `ready_tx`, then accumulates chunks until the
/// stop flag is raised, finalizing the buffer into a WAV blob as the thread's
/// return value. The stream handle drops on exit, releasing the microphone
/// before the caller sees the blob.
fn capture_thread(
    constraints: AudioConstraints,
    level_cell: Arc<Mutex<f32>>,
    stop_flag: Arc<AtomicBool>,
    ready_tx: mpsc::Sender<Result<(), DeviceError>>,
) -> Option<Vec<u8>> {
    let capture = match AudioCapture::acquire(&constraints) {
        Ok(c) => c,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return None;
        }
    };

    let (tx, rx) = mpsc::channel();
    let handle = match capture.start(tx) {
        Ok(h) => h,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return None;
        }
    };

    let _ = ready_tx.send(Ok(()));

    let mut buffer = RecordingBuffer::new(capture.sample_rate(), capture.channels());

    while !stop_flag.load(Ordering::Relaxed) {
        match rx.recv_timeout(CAPTURE_POLL) {
            Ok(chunk) => {
                *level_cell.lock().unwrap() = rms(&chunk.samples);
                buffer.push_chunk(&chunk.samples);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    // Collect whatever the callback delivered before the stop.
    while let Ok(chunk) = rx.try_recv() {
        buffer.push_chunk(&chunk.samples);
    }

    drop(handle); // release the microphone before handing the take over
    log::debug!(
        "voice: capture ended, {:.2}s recorded",
        buffer.duration_secs()
    );

    buffer.finalize_wav()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::{MockSynthesizer, MockTranscriber};

    fn recorder(
        transcriber: MockTranscriber,
        synthesizer: MockSynthesizer,
    ) -> VoiceRecorder {
        VoiceRecorder::new(
            Arc::new(transcriber),
            Arc::new(synthesizer),
            AudioConfig::default(),
        )
    }

    // ---- stop() without start() -------------------------------------------

    /// `stop()` when recording never started must resolve to `None` without
    /// touching any device.
    #[tokio::test]
    async fn stop_when_never_started_returns_none() {
        let mut rec = recorder(MockTranscriber::ok("ignored"), MockSynthesizer::ok(vec![]));
        let result = rec.stop().await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn stop_twice_returns_none_both_times() {
        let mut rec = recorder(MockTranscriber::ok("ignored"), MockSynthesizer::ok(vec![]));
        assert_eq!(rec.stop().await.unwrap(), None);
        assert_eq!(rec.stop().await.unwrap(), None);
    }

    // ---- Transcription hand-off -------------------------------------------

    #[tokio::test]
    async fn transcription_success_returns_text_and_clears_flag() {
        let rec = recorder(
            MockTranscriber::ok("tank level low"),
            MockSynthesizer::ok(vec![]),
        );

        let text = rec.run_transcription(vec![0u8; 64]).await.unwrap();
        assert_eq!(text.as_deref(), Some("tank level low"));

        let st = rec.state.lock().unwrap();
        assert!(!st.is_transcribing);
        assert!(!st.is_recording, "never recording during transcription");
    }

    #[tokio::test]
    async fn empty_transcript_maps_to_none() {
        let rec = recorder(MockTranscriber::ok("   "), MockSynthesizer::ok(vec![]));
        assert_eq!(rec.run_transcription(vec![0u8; 8]).await.unwrap(), None);
    }

    /// A failed upload must surface as an error with `is_transcribing`
    /// cleared — the session stays retryable, never stuck.
    #[tokio::test]
    async fn transcription_failure_clears_flag_and_errors() {
        let rec = recorder(MockTranscriber::err("503"), MockSynthesizer::ok(vec![]));

        let err = rec.run_transcription(vec![0u8; 8]).await.unwrap_err();
        assert!(matches!(err, VoiceError::Transcription(_)));
        assert!(!rec.state.lock().unwrap().is_transcribing);
    }

    #[tokio::test]
    async fn transcription_upload_size_is_recorded() {
        let mock = Arc::new(MockTranscriber::ok("ok"));
        let rec = VoiceRecorder::new(
            Arc::clone(&mock) as Arc<dyn TranscriptionClient>,
            Arc::new(MockSynthesizer::ok(vec![])),
            AudioConfig::default(),
        );

        let _ = rec.run_transcription(vec![0u8; 1234]).await.unwrap();
        assert_eq!(*mock.uploads.lock().unwrap(), vec![1234]);
    }

    // ---- Playback ---------------------------------------------------------

    /// A synthesis failure must clear `is_playing` and report the error
    /// before any audio hardware is touched.
    #[tokio::test]
    async fn synthesis_failure_clears_is_playing() {
        let mut rec = recorder(MockTranscriber::ok("ok"), MockSynthesizer::err("api down"));

        let err = rec.play_response("hello technician").await.unwrap_err();
        assert!(matches!(err, VoiceError::Synthesis(_)));
        assert!(!rec.state.lock().unwrap().is_playing);
    }

    // ---- cleanup ----------------------------------------------------------

    #[tokio::test]
    async fn cleanup_resets_state_when_idle() {
        let mut rec = recorder(MockTranscriber::ok("ok"), MockSynthesizer::ok(vec![]));
        rec.state.lock().unwrap().audio_level = 0.7;

        rec.cleanup();

        let st = rec.state.lock().unwrap();
        assert_eq!(*st, Default::default());
    }

    // ---- Shared state -----------------------------------------------------

    #[tokio::test]
    async fn shared_state_reflects_recorder_state() {
        let rec = recorder(MockTranscriber::ok("ok"), MockSynthesizer::ok(vec![]));
        let shared = rec.shared_state();

        rec.state.lock().unwrap().is_transcribing = true;
        assert!(shared.lock().unwrap().is_transcribing);
    }

    #[test]
    fn recorder_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<VoiceRecorder>();
    }
}
