//! field-capture — the device-facing capture core of a mobile field-service
//! assistant for petroleum equipment technicians.
//!
//! # What lives here
//!
//! - [`voice`] — microphone recording with a live level signal, remote
//!   transcription, and synthesized-response playback.
//! - [`scanner`] — camera preview, frame capture, and confidence-gated OCR
//!   for error codes, barcodes, and free text.
//! - [`audio`], [`camera`], [`speech`], [`ocr`] — the building blocks the
//!   two orchestrators are made of.
//! - [`device`] — classified hardware failures and acquisition constraints.
//! - [`config`] — TOML settings with platform paths.
//!
//! # Architecture
//!
//! ```text
//!          VoiceRecorder                    CaptureOrchestrator
//!         ┌──────┴───────┐                 ┌───────┴────────┐
//!         ▼              ▼                 ▼                ▼
//!    audio (cpal)    speech (reqwest)  camera (trait)   ocr (trait)
//!         │              │                 │                │
//!     microphone    /transcription    CameraBackend   RecognizerBackend
//!                   /speech-synthesis  (host-wired)     (host-wired)
//! ```
//!
//! Hardware and network failures are classified at each boundary and never
//! panic through it; every failure path lands in a re-triggerable state.
//! Camera and microphone streams are RAII guards, so teardown — explicit or
//! by drop — always releases the hardware.
//!
//! # Quick start
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! use field_capture::config::AppConfig;
//! use field_capture::speech::{HttpSynthesizer, HttpTranscriber};
//! use field_capture::voice::VoiceRecorder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//!
//! let mut voice = VoiceRecorder::new(
//!     Arc::new(HttpTranscriber::from_config(&config.api)),
//!     Arc::new(HttpSynthesizer::from_config(&config.api)),
//!     config.audio.clone(),
//! );
//!
//! voice.start().await?;
//! // … technician speaks; UI renders voice.shared_state() …
//! if let Some(text) = voice.stop().await? {
//!     println!("heard: {text}");
//!     voice.play_response("Work order updated.").await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod camera;
pub mod config;
pub mod device;
pub mod ocr;
pub mod scanner;
pub mod speech;
pub mod voice;
