//! Scanner state machine and shared scan state.
//!
//! [`ScanPhase`] drives the capture orchestrator; the UI reads it via
//! [`SharedScanState`] to render the matching view (start button, live
//! preview, spinner, result card).

use std::sync::{Arc, Mutex};

use crate::ocr::RecognitionResult;

// ---------------------------------------------------------------------------
// ScanPhase
// ---------------------------------------------------------------------------

/// Phases of the camera/OCR scanner.
///
/// ```text
/// Closed ──open()──▶ CameraOff ──start_camera()──▶ CameraOn
///                                                     │
///                                   capture() ──▶ Processing
///                                                     │
///                            ┌─── recognition ok ─────┤
///                            ▼                        ▼ (failure)
///                       ResultShown              CameraOn
///                        │       │
///            accept_result()   rescan()
///                        ▼       ▼
///                     Closed  CameraOn
///
/// close() ──▶ Closed   (from any phase)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// The scanner UI is not shown.
    Closed,

    /// Open, but the camera has not been started yet.
    CameraOff,

    /// Live preview running; capture is armed.
    CameraOn,

    /// A frame is being recognized; further captures are rejected.
    Processing,

    /// A recognition result is displayed, awaiting accept or re-scan.
    ResultShown,
}

impl ScanPhase {
    /// `true` while a recognition pass is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, ScanPhase::Processing)
    }

    /// A short human-readable label for the UI status line.
    pub fn label(&self) -> &'static str {
        match self {
            ScanPhase::Closed => "closed",
            ScanPhase::CameraOff => "camera off",
            ScanPhase::CameraOn => "camera on",
            ScanPhase::Processing => "processing",
            ScanPhase::ResultShown => "result shown",
        }
    }
}

impl Default for ScanPhase {
    fn default() -> Self {
        ScanPhase::Closed
    }
}

// ---------------------------------------------------------------------------
// ScanState
// ---------------------------------------------------------------------------

/// Everything the scanner UI needs each frame.
#[derive(Debug, Clone, Default)]
pub struct ScanState {
    /// Current phase of the scanner.
    pub phase: ScanPhase,

    /// The held recognition result while `phase == ResultShown`.
    pub result: Option<RecognitionResult>,

    /// Human-readable failure or low-confidence advisory, cleared on the
    /// next successful transition.
    pub error_message: Option<String>,
}

// ---------------------------------------------------------------------------
// SharedScanState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`ScanState`]. Lock briefly; never across `.await`.
pub type SharedScanState = Arc<Mutex<ScanState>>;

/// Construct a new [`SharedScanState`] in the closed phase.
pub fn new_shared_scan_state() -> SharedScanState {
    Arc::new(Mutex::new(ScanState::default()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_phase_is_closed() {
        assert_eq!(ScanPhase::default(), ScanPhase::Closed);
        assert_eq!(ScanState::default().phase, ScanPhase::Closed);
    }

    #[test]
    fn only_processing_is_busy() {
        assert!(ScanPhase::Processing.is_busy());
        for phase in [
            ScanPhase::Closed,
            ScanPhase::CameraOff,
            ScanPhase::CameraOn,
            ScanPhase::ResultShown,
        ] {
            assert!(!phase.is_busy(), "{phase:?} must not be busy");
        }
    }

    #[test]
    fn labels_are_distinct() {
        let labels = [
            ScanPhase::Closed.label(),
            ScanPhase::CameraOff.label(),
            ScanPhase::CameraOn.label(),
            ScanPhase::Processing.label(),
            ScanPhase::ResultShown.label(),
        ];
        for (i, a) in labels.iter().enumerate() {
            for b in labels.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn shared_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedScanState>();
    }
}
