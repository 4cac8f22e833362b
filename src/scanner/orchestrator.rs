//! Capture orchestrator — camera preview, frame capture, and recognition.
//!
//! [`CaptureOrchestrator`] coordinates the camera session and the shared
//! recognition engine, holding the scanner state machine together:
//!
//! - one frame → one recognition pass → one result, strictly sequential;
//! - a capture while one is already processing is rejected, never
//!   interleaved — the recognizer's parameter state is engine-global;
//! - every failure path lands back in a re-triggerable phase;
//! - `close()` releases the camera unconditionally. The camera session is an
//!   RAII guard, so dropping the orchestrator (or cancelling an in-flight
//!   `capture()` future and then closing) can never leak the stream, and a
//!   recognition result arriving after close is simply discarded.

use std::sync::Arc;

use thiserror::Error;

use crate::camera::{CameraBackend, CameraSession};
use crate::config::CameraConfig;
use crate::device::{DeviceError, Facing};
use crate::ocr::{OcrEngine, OcrError, RecognitionResult, ScanMode};

use super::state::{new_shared_scan_state, ScanPhase, SharedScanState};

// ---------------------------------------------------------------------------
// ScanError
// ---------------------------------------------------------------------------

/// Failures surfaced by the scanner.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Camera acquisition or switching failed.
    #[error("camera error: {0}")]
    Camera(#[from] DeviceError),

    /// A recognition pass is already in flight; try again when it finishes.
    #[error("a scan is already processing")]
    Busy,

    /// The operation is not valid in the current phase.
    #[error("operation not valid while {0}")]
    InvalidPhase(&'static str),

    /// The preview frame could not be captured or encoded.
    #[error("failed to capture an image from the camera")]
    CaptureFailed,

    /// The recognition engine failed.
    #[error(transparent)]
    Ocr(#[from] OcrError),

    /// The held result is below the confidence gate. Not a failure — the
    /// technician is asked to reposition and re-scan before accepting.
    #[error("recognition confidence too low — reposition and scan again")]
    LowConfidence,

    /// There is no usable result to accept.
    #[error("no recognition result to accept")]
    NoResult,
}

// ---------------------------------------------------------------------------
// CaptureOrchestrator
// ---------------------------------------------------------------------------

/// Drives one scanner instance: at most one camera stream, one recognition
/// pass, and one held result at a time.
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// use field_capture::camera::CameraBackend;
/// use field_capture::config::CameraConfig;
/// use field_capture::ocr::{OcrEngine, ScanMode};
/// use field_capture::scanner::CaptureOrchestrator;
///
/// # async fn example(backend: Arc<dyn CameraBackend>, engine: Arc<OcrEngine>) {
/// let mut scanner = CaptureOrchestrator::new(
///     backend,
///     engine,
///     ScanMode::ErrorCode,
///     &CameraConfig::default(),
/// );
/// scanner.open();
/// scanner.start_camera().await.unwrap();
/// let result = scanner.capture().await.unwrap();
/// if result.meets_gate() {
///     let code = scanner.accept_result().unwrap();
///     println!("scanned: {code}");
/// }
/// # }
/// ```
pub struct CaptureOrchestrator {
    state: SharedScanState,
    camera: CameraSession,
    engine: Arc<OcrEngine>,
    mode: ScanMode,
    facing: Facing,
}

impl CaptureOrchestrator {
    /// Create a closed scanner.
    pub fn new(
        backend: Arc<dyn CameraBackend>,
        engine: Arc<OcrEngine>,
        mode: ScanMode,
        config: &CameraConfig,
    ) -> Self {
        Self {
            state: new_shared_scan_state(),
            camera: CameraSession::new(backend, config.constraints()),
            engine,
            mode,
            facing: config.default_facing,
        }
    }

    /// Shared state handle for the UI to poll.
    pub fn shared_state(&self) -> SharedScanState {
        Arc::clone(&self.state)
    }

    /// Current phase.
    pub fn phase(&self) -> ScanPhase {
        self.state.lock().unwrap().phase
    }

    /// The held result while one is shown.
    pub fn result(&self) -> Option<RecognitionResult> {
        self.state.lock().unwrap().result.clone()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Open the scanner. A no-op unless currently closed.
    pub fn open(&mut self) {
        let mut st = self.state.lock().unwrap();
        if st.phase != ScanPhase::Closed {
            log::warn!("scanner: open() while {} — ignored", st.phase.label());
            return;
        }
        st.phase = ScanPhase::CameraOff;
        st.result = None;
        st.error_message = None;
    }

    /// Start the live preview and warm up the recognition engine.
    ///
    /// Engine initialization runs fire-and-forget in the background — a
    /// failure there is logged and retried lazily on the first capture; it
    /// never blocks the camera from opening.
    pub async fn start_camera(&mut self) -> Result<(), ScanError> {
        if self.phase() != ScanPhase::CameraOff {
            return Err(ScanError::InvalidPhase(self.phase().label()));
        }

        match self.camera.acquire(self.facing).await {
            Ok(()) => {
                let mut st = self.state.lock().unwrap();
                st.phase = ScanPhase::CameraOn;
                st.error_message = None;
            }
            Err(e) => {
                self.state.lock().unwrap().error_message = Some(e.to_string());
                return Err(e.into());
            }
        }

        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            if let Err(e) = engine.ensure_initialized().await {
                log::warn!("scanner: background recognizer init failed: {e}");
            }
        });

        Ok(())
    }

    /// Release the camera and return to the closed phase, unconditionally.
    ///
    /// Any held result is discarded. Valid in every phase.
    pub fn close(&mut self) {
        self.camera.release();
        let mut st = self.state.lock().unwrap();
        st.phase = ScanPhase::Closed;
        st.result = None;
        st.error_message = None;
        log::debug!("scanner: closed");
    }

    // -----------------------------------------------------------------------
    // Scanning
    // -----------------------------------------------------------------------

    /// Snapshot the current frame and run it through the recognition engine.
    ///
    /// Valid only while the camera is on. While a pass is processing a
    /// second call returns [`ScanError::Busy`]; on recognition failure the
    /// scanner returns to the live preview so the technician can try again.
    pub async fn capture(&mut self) -> Result<RecognitionResult, ScanError> {
        {
            let mut st = self.state.lock().unwrap();
            match st.phase {
                ScanPhase::CameraOn => {}
                ScanPhase::Processing => return Err(ScanError::Busy),
                other => return Err(ScanError::InvalidPhase(other.label())),
            }
            st.phase = ScanPhase::Processing;
            st.error_message = None;
        }

        let Some(jpeg) = self.camera.capture_jpeg() else {
            let mut st = self.state.lock().unwrap();
            st.phase = ScanPhase::CameraOn;
            st.error_message = Some("failed to capture an image from the camera".into());
            return Err(ScanError::CaptureFailed);
        };

        match self.engine.recognize(self.mode, &jpeg).await {
            Ok(result) => {
                log::info!(
                    "scanner: recognized {:?} at {:.0}% confidence",
                    result.accepted_text(),
                    result.confidence
                );
                let mut st = self.state.lock().unwrap();
                st.phase = ScanPhase::ResultShown;
                if !result.meets_gate_at(self.engine.gate()) {
                    st.error_message =
                        Some("low confidence — try repositioning the camera".into());
                }
                st.result = Some(result.clone());
                Ok(result)
            }
            Err(e) => {
                log::error!("scanner: recognition failed: {e}");
                let mut st = self.state.lock().unwrap();
                st.phase = ScanPhase::CameraOn;
                st.error_message = Some("unable to read text from the image".into());
                Err(e.into())
            }
        }
    }

    /// Switch between front and rear cameras. Valid only while the preview
    /// is live; on failure the session falls back to the previous facing.
    pub async fn switch_camera(&mut self) -> Result<(), ScanError> {
        if self.phase() != ScanPhase::CameraOn {
            return Err(ScanError::InvalidPhase(self.phase().label()));
        }

        match self.camera.switch_facing().await {
            Ok(()) => Ok(()),
            Err(e) => {
                let mut st = self.state.lock().unwrap();
                st.error_message = self.camera.error().map(str::to_string);
                if !self.camera.is_active() {
                    // Fallback also failed; the preview is gone.
                    st.phase = ScanPhase::CameraOff;
                }
                Err(e.into())
            }
        }
    }

    /// Discard the shown result and return to the live preview.
    pub fn rescan(&mut self) -> Result<(), ScanError> {
        let mut st = self.state.lock().unwrap();
        if st.phase != ScanPhase::ResultShown {
            return Err(ScanError::InvalidPhase(st.phase.label()));
        }
        st.phase = ScanPhase::CameraOn;
        st.result = None;
        st.error_message = None;
        Ok(())
    }

    /// Accept the shown result and close the scanner.
    ///
    /// Emits the extracted value (or the full text when no mode-specific
    /// extraction matched). Blocked while the result sits below the
    /// confidence gate — the technician must re-scan or reposition first.
    pub fn accept_result(&mut self) -> Result<String, ScanError> {
        let text = {
            let st = self.state.lock().unwrap();
            if st.phase != ScanPhase::ResultShown {
                return Err(ScanError::InvalidPhase(st.phase.label()));
            }
            let Some(result) = st.result.as_ref() else {
                return Err(ScanError::NoResult);
            };
            if !result.meets_gate_at(self.engine.gate()) {
                return Err(ScanError::LowConfidence);
            }
            result.accepted_text().trim().to_string()
        };

        if text.is_empty() {
            return Err(ScanError::NoResult);
        }

        self.close();
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
