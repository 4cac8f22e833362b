//! Camera acquisition and session lifecycle.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │              CameraSession                     │
//! │  acquire / release / switch_facing /           │
//! │  capture_image / record_video / enumerate      │
//! │                     │                          │
//! │                     ▼                          │
//! │        CameraBackend (trait)                   │
//! │  open(constraints) → Box<dyn CameraStream>     │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! The backend is the platform seam; everything above it — one-stream-per-
//! session ownership, idempotent release, switch-with-fallback, JPEG/base64
//! frame capture — lives in [`CameraSession`] and is platform-independent.

pub mod backend;
pub mod session;

pub use backend::{CameraBackend, CameraInfo, CameraStream, Frame};
pub use session::CameraSession;

#[cfg(test)]
pub use backend::{MockCameraBackend, MockCameraStream};
