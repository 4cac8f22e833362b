//! Recognizer capability boundary.
//!
//! Optical recognition runs in-process but behind a trait, the same seam the
//! camera uses: the host wires in a concrete engine (Tesseract bindings, an
//! ONNX text recognizer, a cloud fallback) and the crate owns lifecycle,
//! parameter hygiene, and extraction on top of it.
//!
//! The backend's whitelist/segmentation configuration is **engine-global
//! state** — `set_parameters` affects every subsequent `recognize` until
//! changed. [`crate::ocr::OcrEngine`] serializes access and guarantees the
//! defaults are restored after mode-specific tuning.

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Page-layout assumption the recognizer applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSegmentation {
    /// A uniform block of text — labels, nameplates, display panels.
    Block,
    /// A single text line — barcode caption strips.
    SingleLine,
}

/// Character whitelist plus segmentation mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizerParams {
    /// Characters the recognizer may emit.
    pub whitelist: String,
    pub segmentation: PageSegmentation,
}

impl RecognizerParams {
    /// Defaults for free text and error codes: full alphanumerics plus the
    /// separators that appear on equipment labels.
    pub fn general_text() -> Self {
        Self {
            whitelist: "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_/\\:. "
                .to_string(),
            segmentation: PageSegmentation::Block,
        }
    }

    /// Barcode tuning: uppercase alphanumerics only, single line.
    pub fn barcode() -> Self {
        Self {
            whitelist: "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ".to_string(),
            segmentation: PageSegmentation::SingleLine,
        }
    }
}

impl Default for RecognizerParams {
    fn default() -> Self {
        Self::general_text()
    }
}

// ---------------------------------------------------------------------------
// RawRecognition
// ---------------------------------------------------------------------------

/// What the backend produces for one image: recognized text plus a
/// confidence score on a 0–100 scale.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecognition {
    pub text: String,
    pub confidence: f32,
}

// ---------------------------------------------------------------------------
// OcrError
// ---------------------------------------------------------------------------

/// Errors from the recognition subsystem.
#[derive(Debug, Clone, Error)]
pub enum OcrError {
    /// The backend failed to initialize.
    #[error("recognizer initialization failed: {0}")]
    Init(String),

    /// Applying whitelist/segmentation parameters failed.
    #[error("recognizer configuration failed: {0}")]
    Configuration(String),

    /// The recognition pass itself failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

// ---------------------------------------------------------------------------
// RecognizerBackend trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe recognizer interface.
///
/// # Contract
///
/// - `initialize` is expensive; callers invoke it once and reuse the
///   instance. Re-initializing an initialized backend is allowed but
///   wasteful.
/// - `recognize` takes an encoded still image (JPEG/PNG) and runs under the
///   parameters most recently applied with `set_parameters`.
/// - `terminate` must be safe to call when never initialized (no-op).
#[async_trait]
pub trait RecognizerBackend: Send + Sync {
    async fn initialize(&self) -> Result<(), OcrError>;

    async fn set_parameters(&self, params: &RecognizerParams) -> Result<(), OcrError>;

    async fn recognize(&self, image: &[u8]) -> Result<RawRecognition, OcrError>;

    async fn terminate(&self) -> Result<(), OcrError>;
}

// Compile-time assertion: Box<dyn RecognizerBackend> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn RecognizerBackend>) {}
};

// ---------------------------------------------------------------------------
// MockRecognizer  (test-only)
// ---------------------------------------------------------------------------

/// A scriptable backend that records every lifecycle and parameter call so
/// tests can assert initialization counts, parameter sequencing, and the
/// parameters in effect at each recognition.
#[cfg(test)]
pub struct MockRecognizer {
    response: Result<RawRecognition, String>,
    pub init_count: std::sync::atomic::AtomicUsize,
    pub terminate_count: std::sync::atomic::AtomicUsize,
    /// Every `set_parameters` call, in order.
    pub param_history: std::sync::Mutex<Vec<RecognizerParams>>,
    /// Parameters in effect at each `recognize` call.
    pub recognize_params: std::sync::Mutex<Vec<RecognizerParams>>,
    current: std::sync::Mutex<RecognizerParams>,
}

#[cfg(test)]
impl MockRecognizer {
    /// A backend that always recognizes `text` at `confidence`.
    pub fn ok(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            response: Ok(RawRecognition {
                text: text.into(),
                confidence,
            }),
            init_count: std::sync::atomic::AtomicUsize::new(0),
            terminate_count: std::sync::atomic::AtomicUsize::new(0),
            param_history: std::sync::Mutex::new(Vec::new()),
            recognize_params: std::sync::Mutex::new(Vec::new()),
            current: std::sync::Mutex::new(RecognizerParams::default()),
        }
    }

    /// A backend whose recognition pass always fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            ..Self::ok("", 0.0)
        }
    }

    /// Parameters currently applied to the engine.
    pub fn current_params(&self) -> RecognizerParams {
        self.current.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl RecognizerBackend for MockRecognizer {
    async fn initialize(&self) -> Result<(), OcrError> {
        self.init_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    async fn set_parameters(&self, params: &RecognizerParams) -> Result<(), OcrError> {
        *self.current.lock().unwrap() = params.clone();
        self.param_history.lock().unwrap().push(params.clone());
        Ok(())
    }

    async fn recognize(&self, _image: &[u8]) -> Result<RawRecognition, OcrError> {
        self.recognize_params
            .lock()
            .unwrap()
            .push(self.current.lock().unwrap().clone());
        match &self.response {
            Ok(raw) => Ok(raw.clone()),
            Err(msg) => Err(OcrError::Recognition(msg.clone())),
        }
    }

    async fn terminate(&self) -> Result<(), OcrError> {
        self.terminate_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_are_general_text() {
        let params = RecognizerParams::default();
        assert_eq!(params, RecognizerParams::general_text());
        assert_eq!(params.segmentation, PageSegmentation::Block);
        assert!(params.whitelist.contains('a'));
        assert!(params.whitelist.contains(' '));
    }

    #[test]
    fn barcode_params_are_uppercase_single_line() {
        let params = RecognizerParams::barcode();
        assert_eq!(params.segmentation, PageSegmentation::SingleLine);
        assert!(!params.whitelist.contains('a'));
        assert!(!params.whitelist.contains(' '));
        assert!(params.whitelist.contains('Z'));
        assert!(params.whitelist.contains('9'));
    }

    #[tokio::test]
    async fn mock_records_recognize_time_params() {
        let mock = MockRecognizer::ok("E47", 80.0);
        mock.set_parameters(&RecognizerParams::barcode())
            .await
            .unwrap();
        let _ = mock.recognize(b"img").await.unwrap();

        let seen = mock.recognize_params.lock().unwrap();
        assert_eq!(seen[0], RecognizerParams::barcode());
    }

    #[tokio::test]
    async fn mock_failing_reports_recognition_error() {
        let mock = MockRecognizer::failing("blurred");
        let err = mock.recognize(b"img").await.unwrap_err();
        assert!(matches!(err, OcrError::Recognition(_)));
    }

    #[test]
    fn box_dyn_recognizer_backend_compiles() {
        let _backend: Box<dyn RecognizerBackend> = Box::new(MockRecognizer::ok("x", 1.0));
    }
}
