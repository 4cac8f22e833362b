//! Optical recognition — engine lifecycle, mode tuning, and extraction.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     OcrEngine                           │
//! │   lazy init · single-operation lock · param restore     │
//! │                                                         │
//! │   recognize_text ───────────┐                           │
//! │   recognize_error_code ──┐  │     RecognizerBackend     │
//! │   recognize_barcode ──┐  │  ├───▶ (trait: initialize /  │
//! │                       │  │  │      set_parameters /     │
//! │                       ▼  ▼  ▼      recognize /          │
//! │                    extract.rs       terminate)          │
//! │              error-code & barcode                       │
//! │                  heuristics                             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers gate presentation on [`RecognitionResult::meets_gate`]; a result
//! below [`CONFIDENCE_GATE`] is advisory, not an error.

pub mod backend;
pub mod engine;
pub mod extract;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use backend::{
    OcrError, PageSegmentation, RawRecognition, RecognizerBackend, RecognizerParams,
};
pub use engine::{OcrEngine, RecognitionResult, ScanMode, CONFIDENCE_GATE};
pub use extract::{extract_barcode, extract_error_code};

// test-only re-export so the scanner tests can script the backend without
// the full path.
#[cfg(test)]
pub use backend::MockRecognizer;
