//! Audio pipeline — microphone capture → session buffer → level signal.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → RecordingBuffer
//!                                   │                    └─ finalize_wav() on stop
//!                                   └─ LevelMeter → VoiceState::audio_level
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::mpsc;
//! use field_capture::audio::{AudioCapture, AudioChunk};
//! use field_capture::device::AudioConstraints;
//!
//! let (tx, rx) = mpsc::channel::<AudioChunk>();
//! let capture = AudioCapture::acquire(&AudioConstraints::default()).unwrap();
//! let _handle = capture.start(tx).unwrap(); // drop handle → stops stream
//!
//! while let Ok(chunk) = rx.recv() {
//!     println!("received {} samples @ {}Hz", chunk.samples.len(), chunk.sample_rate);
//! }
//! ```

pub mod buffer;
pub mod capture;
pub mod level;

pub use buffer::{downmix_to_mono, RecordingBuffer};
pub use capture::{AudioCapture, AudioChunk, StreamHandle};
pub use level::{rms, LevelMeter};
