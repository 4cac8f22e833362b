//! Scanner — the camera/OCR capture orchestrator.
//!
//! Ties a [`crate::camera::CameraSession`] to the shared
//! [`crate::ocr::OcrEngine`] behind the phase machine in
//! [`state::ScanPhase`]: open the scanner, start the preview (warming the
//! recognizer in the background), capture one frame at a time, and either
//! accept the confidence-gated result or re-scan.

pub mod orchestrator;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use orchestrator::{CaptureOrchestrator, ScanError};
pub use state::{new_shared_scan_state, ScanPhase, ScanState, SharedScanState};
