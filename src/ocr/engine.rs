//! Recognition engine — lifecycle, parameter hygiene, and extraction.
//!
//! [`OcrEngine`] owns the shared [`RecognizerBackend`] singleton. The backend
//! is expensive to initialize, so it is brought up lazily on first use and
//! reused across calls; its whitelist/segmentation configuration is global
//! engine state, so every set-params → recognize → restore cycle runs under
//! one `tokio::sync::Mutex` and barcode tuning is always reverted to the
//! general-text defaults before the call returns — recognition failures
//! included.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::OcrConfig;

use super::backend::{OcrError, RecognizerBackend, RecognizerParams};
use super::extract::{extract_barcode, extract_error_code};

/// Minimum confidence (0–100) at which a result is auto-usable.
///
/// The comparison is inclusive: 30 passes, 29 prompts the technician to
/// reposition and re-scan.
pub const CONFIDENCE_GATE: f32 = 30.0;

// ---------------------------------------------------------------------------
// ScanMode
// ---------------------------------------------------------------------------

/// What the technician is pointing the camera at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Free text — labels, panels, placards.
    GeneralText,
    /// A dispenser/pump error code.
    ErrorCode,
    /// A barcode caption strip.
    Barcode,
}

// ---------------------------------------------------------------------------
// RecognitionResult
// ---------------------------------------------------------------------------

/// The structured outcome of one recognition pass. Never mutated after
/// creation; consumed once by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    /// Raw recognized text, trimmed.
    pub text: String,
    /// Recognizer confidence on a 0–100 scale.
    pub confidence: f32,
    /// Mode-specific parsed value when a heuristic matched.
    pub extracted: Option<String>,
}

impl RecognitionResult {
    /// Whether the result clears the default [`CONFIDENCE_GATE`].
    pub fn meets_gate(&self) -> bool {
        self.meets_gate_at(CONFIDENCE_GATE)
    }

    /// Whether the result clears a caller-supplied gate — the scanner uses
    /// the engine's configured gate here.
    pub fn meets_gate_at(&self, gate: f32) -> bool {
        self.confidence >= gate
    }

    /// The value to hand to the caller: the extracted code when present,
    /// otherwise the full recognized text.
    pub fn accepted_text(&self) -> &str {
        self.extracted.as_deref().unwrap_or(&self.text)
    }
}

// ---------------------------------------------------------------------------
// OcrEngine
// ---------------------------------------------------------------------------

/// Serialized front-end over the shared recognizer backend.
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// use field_capture::ocr::{OcrEngine, RecognizerBackend};
///
/// # async fn example(backend: Arc<dyn RecognizerBackend>) {
/// let engine = OcrEngine::new(backend);
/// let result = engine.recognize_error_code(b"...jpeg...").await.unwrap();
/// if result.meets_gate() {
///     println!("code: {}", result.accepted_text());
/// }
/// # }
/// ```
pub struct OcrEngine {
    backend: Arc<dyn RecognizerBackend>,
    /// Guards the backend's global parameter state; holds whether the
    /// backend has been initialized.
    op_lock: Mutex<bool>,
    gate: f32,
}

impl OcrEngine {
    /// Wrap a backend with the default [`CONFIDENCE_GATE`]. Nothing is
    /// initialized until the first call.
    pub fn new(backend: Arc<dyn RecognizerBackend>) -> Self {
        Self {
            backend,
            op_lock: Mutex::new(false),
            gate: CONFIDENCE_GATE,
        }
    }

    /// Wrap a backend with the configured confidence gate.
    pub fn from_config(backend: Arc<dyn RecognizerBackend>, config: &OcrConfig) -> Self {
        Self {
            gate: config.confidence_gate,
            ..Self::new(backend)
        }
    }

    /// The confidence gate this engine's results are judged against.
    pub fn gate(&self) -> f32 {
        self.gate
    }

    /// Bring the backend up eagerly.
    ///
    /// The scanner fires this in the background when the camera opens so the
    /// first capture does not pay the initialization cost. Idempotent.
    pub async fn ensure_initialized(&self) -> Result<(), OcrError> {
        let mut initialized = self.op_lock.lock().await;
        self.init_locked(&mut initialized).await
    }

    /// Tear the backend down. Safe to call when never initialized (no-op);
    /// a later recognition lazily re-initializes.
    pub async fn terminate(&self) -> Result<(), OcrError> {
        let mut initialized = self.op_lock.lock().await;
        if !*initialized {
            return Ok(());
        }
        self.backend.terminate().await?;
        *initialized = false;
        log::debug!("ocr: recognizer terminated");
        Ok(())
    }

    /// Dispatch to the mode-specific recognition call.
    pub async fn recognize(&self, mode: ScanMode, image: &[u8]) -> Result<RecognitionResult, OcrError> {
        match mode {
            ScanMode::GeneralText => self.recognize_text(image).await,
            ScanMode::ErrorCode => self.recognize_error_code(image).await,
            ScanMode::Barcode => self.recognize_barcode(image).await,
        }
    }

    /// Recognize free text under the default parameters.
    pub async fn recognize_text(&self, image: &[u8]) -> Result<RecognitionResult, OcrError> {
        let mut initialized = self.op_lock.lock().await;
        self.init_locked(&mut initialized).await?;

        let raw = self.backend.recognize(image).await?;
        Ok(RecognitionResult {
            text: raw.text.trim().to_string(),
            confidence: raw.confidence,
            extracted: None,
        })
    }

    /// Recognize under default parameters, then run the error-code
    /// heuristics over the text.
    pub async fn recognize_error_code(&self, image: &[u8]) -> Result<RecognitionResult, OcrError> {
        let mut result = self.recognize_text(image).await?;
        result.extracted = extract_error_code(&result.text);
        Ok(result)
    }

    /// Recognize with barcode tuning, restoring the default parameters
    /// before returning.
    ///
    /// The restore runs whether or not recognition succeeded; the next call
    /// — this engine's or another session's — depends on the defaults.
    pub async fn recognize_barcode(&self, image: &[u8]) -> Result<RecognitionResult, OcrError> {
        let mut initialized = self.op_lock.lock().await;
        self.init_locked(&mut initialized).await?;

        self.backend
            .set_parameters(&RecognizerParams::barcode())
            .await?;

        let recognized = self.backend.recognize(image).await;
        let restored = self
            .backend
            .set_parameters(&RecognizerParams::general_text())
            .await;
        drop(initialized);

        let raw = recognized?;
        restored?;

        let text = raw.text.trim().to_string();
        let extracted = extract_barcode(&text);
        Ok(RecognitionResult {
            text,
            confidence: raw.confidence,
            extracted,
        })
    }

    /// Initialize under an already-held lock.
    async fn init_locked(&self, initialized: &mut bool) -> Result<(), OcrError> {
        if *initialized {
            return Ok(());
        }
        self.backend.initialize().await?;
        self.backend
            .set_parameters(&RecognizerParams::general_text())
            .await?;
        *initialized = true;
        log::info!("ocr: recognizer initialized");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
