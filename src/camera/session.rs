//! Camera session lifecycle.
//!
//! [`CameraSession`] owns at most one live [`CameraStream`] and pairs every
//! acquisition with exactly one release: acquiring stops any existing stream
//! first, `release` is idempotent, and `Drop` releases whatever is still
//! held. Failures are converted into a stored human-readable message plus an
//! error return — nothing from the hardware layer panics through here.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::device::{DeviceError, Facing, VideoConstraints};

use super::backend::{CameraBackend, CameraInfo, CameraStream, Frame};

/// JPEG quality for captured still frames.
const CAPTURE_JPEG_QUALITY: u8 = 80;

// ---------------------------------------------------------------------------
// CameraSession
// ---------------------------------------------------------------------------

/// Owns the live video stream for one scanner instance.
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// use field_capture::camera::{CameraBackend, CameraSession};
/// use field_capture::device::{Facing, VideoConstraints};
///
/// # async fn example(backend: Arc<dyn CameraBackend>) {
/// let mut session = CameraSession::new(backend, VideoConstraints::default());
/// session.acquire(Facing::Environment).await.unwrap();
/// let image = session.capture_image(); // base64 JPEG
/// session.release(); // idempotent
/// # }
/// ```
pub struct CameraSession {
    backend: Arc<dyn CameraBackend>,
    stream: Option<Box<dyn CameraStream>>,
    constraints: VideoConstraints,
    error: Option<String>,
}

impl CameraSession {
    /// Create an inactive session using `constraints` as the resolution and
    /// frame-rate hints for every acquisition.
    pub fn new(backend: Arc<dyn CameraBackend>, constraints: VideoConstraints) -> Self {
        Self {
            backend,
            stream: None,
            constraints,
            error: None,
        }
    }

    /// Acquire a live stream with the given facing mode.
    ///
    /// Any existing stream is stopped first, so a session never holds two
    /// streams. On failure the classified error is stored as the session's
    /// message and returned; the session stays inactive.
    pub async fn acquire(&mut self, facing: Facing) -> Result<(), DeviceError> {
        self.release();

        let constraints = VideoConstraints {
            facing,
            ..self.constraints.clone()
        };

        match self.backend.open(&constraints).await {
            Ok(stream) => {
                log::info!("camera started ({})", facing.as_str());
                self.stream = Some(stream);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                log::error!("camera acquisition failed: {e}");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Stop every track of the current stream. No-op when already released.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            log::debug!("camera released");
        }
    }

    /// `true` while a live stream is held.
    pub fn is_active(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_active())
    }

    /// Facing of the current stream, if any.
    pub fn facing(&self) -> Option<Facing> {
        self.stream.as_ref().map(|s| s.facing())
    }

    /// Last acquisition/capture failure message, cleared on success.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Release the current stream and reacquire with the opposite facing.
    ///
    /// On failure the original facing is reacquired so the caller is not
    /// left without a stream; the switch error is still returned so the UI
    /// can report it.
    pub async fn switch_facing(&mut self) -> Result<(), DeviceError> {
        let current = self
            .facing()
            .ok_or_else(|| DeviceError::Unknown("no active camera stream".into()))?;
        let target = current.opposite();

        match self.acquire(target).await {
            Ok(()) => Ok(()),
            Err(e) => {
                log::warn!("camera switch to {} failed: {e}", target.as_str());
                // Restore the original facing; its own failure wins if it
                // also cannot be acquired.
                self.acquire(current).await?;
                self.error = Some(format!("failed to switch camera: {e}"));
                Err(e)
            }
        }
    }

    /// Snapshot the current frame as JPEG bytes.
    ///
    /// Returns `None` (with the session message set) when no stream is
    /// active or the frame cannot be captured/encoded — capture is
    /// best-effort and never panics.
    pub fn capture_jpeg(&mut self) -> Option<Vec<u8>> {
        let Some(stream) = self.stream.as_mut() else {
            self.error = Some("no active camera stream".into());
            return None;
        };

        let frame = match stream.capture_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("frame capture failed: {e}");
                self.error = Some("failed to capture image".into());
                return None;
            }
        };

        match encode_jpeg(&frame) {
            Ok(jpeg) => Some(jpeg),
            Err(msg) => {
                log::error!("frame encode failed: {msg}");
                self.error = Some("failed to capture image".into());
                None
            }
        }
    }

    /// Snapshot the current frame as a base64-encoded JPEG.
    pub fn capture_image(&mut self) -> Option<String> {
        self.capture_jpeg().map(|jpeg| BASE64.encode(jpeg))
    }

    /// Capture a timed clip as a frame sequence at the configured frame
    /// rate.
    ///
    /// Requires an active stream. Capture stops early if the stream dies
    /// mid-clip; frames collected so far are returned.
    pub async fn record_video(&mut self, duration: Duration) -> Result<Vec<Frame>, DeviceError> {
        let fps = self.constraints.ideal_frame_rate.max(1);
        let frame_count = (duration.as_secs_f64() * fps as f64).round() as usize;
        let period = Duration::from_secs_f64(1.0 / fps as f64);

        let Some(stream) = self.stream.as_mut() else {
            return Err(DeviceError::Unknown("no active camera stream".into()));
        };

        let mut frames = Vec::with_capacity(frame_count);
        let mut ticker = tokio::time::interval(period);

        for _ in 0..frame_count {
            ticker.tick().await;
            match stream.capture_frame() {
                Ok(frame) => frames.push(frame),
                Err(e) => {
                    log::warn!("clip capture ended early: {e}");
                    break;
                }
            }
        }

        Ok(frames)
    }

    /// List available camera devices.
    ///
    /// Enumeration failure yields an empty list rather than an error — a
    /// single-camera UI works either way.
    pub async fn enumerate_video_inputs(&self) -> Vec<CameraInfo> {
        match self.backend.enumerate().await {
            Ok(devices) => devices,
            Err(e) => {
                log::warn!("camera enumeration failed: {e}");
                Vec::new()
            }
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Encode an RGB8 frame as JPEG at the capture quality.
fn encode_jpeg(frame: &Frame) -> Result<Vec<u8>, String> {
    let expected = frame.width as usize * frame.height as usize * 3;
    if frame.rgb.len() != expected {
        return Err(format!(
            "frame buffer is {} bytes, expected {expected}",
            frame.rgb.len()
        ));
    }

    let mut jpeg = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, CAPTURE_JPEG_QUALITY);
    encoder
        .encode(
            &frame.rgb,
            frame.width,
            frame.height,
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| e.to_string())?;
    Ok(jpeg)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::backend::MockCameraBackend;

    fn session(backend: MockCameraBackend) -> CameraSession {
        CameraSession::new(Arc::new(backend), VideoConstraints::default())
    }

    // ---- Acquire / release ------------------------------------------------

    #[tokio::test]
    async fn acquire_then_release_then_reacquire() {
        let mut s = session(MockCameraBackend::ok());

        s.acquire(Facing::Environment).await.unwrap();
        assert!(s.is_active());

        s.release();
        assert!(!s.is_active());

        // No leaked stream references: a fresh acquire succeeds.
        s.acquire(Facing::Environment).await.unwrap();
        assert!(s.is_active());
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let mut s = session(MockCameraBackend::ok());
        s.acquire(Facing::User).await.unwrap();

        s.release();
        s.release(); // second call must be a no-op
        assert!(!s.is_active());
    }

    #[tokio::test]
    async fn acquire_replaces_existing_stream() {
        let backend = Arc::new(MockCameraBackend::ok());
        let mut s = CameraSession::new(
            Arc::clone(&backend) as Arc<dyn CameraBackend>,
            VideoConstraints::default(),
        );

        s.acquire(Facing::Environment).await.unwrap();
        s.acquire(Facing::User).await.unwrap();

        assert_eq!(s.facing(), Some(Facing::User));
        assert_eq!(
            *backend.opened.lock().unwrap(),
            vec![Facing::Environment, Facing::User]
        );
    }

    #[tokio::test]
    async fn acquire_failure_stores_message_and_stays_inactive() {
        let mut s = session(MockCameraBackend::failing(DeviceError::PermissionDenied));

        let err = s.acquire(Facing::Environment).await.unwrap_err();
        assert!(matches!(err, DeviceError::PermissionDenied));
        assert!(!s.is_active());
        assert!(s.error().is_some_and(|m| m.contains("denied")));
    }

    // ---- Facing switch ----------------------------------------------------

    #[tokio::test]
    async fn switch_facing_flips_stream() {
        let mut s = session(MockCameraBackend::ok());
        s.acquire(Facing::Environment).await.unwrap();

        s.switch_facing().await.unwrap();
        assert_eq!(s.facing(), Some(Facing::User));
    }

    #[tokio::test]
    async fn switch_failure_falls_back_to_original_facing() {
        // Front camera is unavailable; the switch must restore the rear one.
        let mut s = session(MockCameraBackend::fail_facing(Facing::User));
        s.acquire(Facing::Environment).await.unwrap();

        let err = s.switch_facing().await.unwrap_err();
        assert!(matches!(err, DeviceError::DeviceBusy));
        assert!(s.is_active(), "caller must not be left without a stream");
        assert_eq!(s.facing(), Some(Facing::Environment));
        assert!(s.error().is_some_and(|m| m.contains("switch")));
    }

    #[tokio::test]
    async fn switch_without_stream_errors() {
        let mut s = session(MockCameraBackend::ok());
        assert!(s.switch_facing().await.is_err());
    }

    // ---- Frame capture ----------------------------------------------------

    #[tokio::test]
    async fn capture_image_returns_base64_jpeg() {
        let mut s = session(MockCameraBackend::ok());
        s.acquire(Facing::Environment).await.unwrap();

        let image = s.capture_image().expect("active stream captures");
        let jpeg = BASE64.decode(image).expect("valid base64");
        // JPEG SOI marker.
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn capture_without_stream_returns_none() {
        let mut s = session(MockCameraBackend::ok());
        assert!(s.capture_image().is_none());
        assert!(s.error().is_some());
    }

    // ---- Clip capture -----------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn record_video_collects_frames_for_duration() {
        let mut s = session(MockCameraBackend::ok());
        s.acquire(Facing::Environment).await.unwrap();

        let frames = s.record_video(Duration::from_millis(100)).await.unwrap();
        // 30 fps × 0.1 s = 3 frames.
        assert_eq!(frames.len(), 3);
    }

    #[tokio::test]
    async fn record_video_without_stream_errors() {
        let mut s = session(MockCameraBackend::ok());
        assert!(s.record_video(Duration::from_millis(10)).await.is_err());
    }

    // ---- Enumeration ------------------------------------------------------

    #[tokio::test]
    async fn enumerate_lists_devices() {
        let s = session(MockCameraBackend::ok());
        let devices = s.enumerate_video_inputs().await;
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].facing, Some(Facing::Environment));
    }

    #[tokio::test]
    async fn enumerate_failure_returns_empty() {
        let s = session(MockCameraBackend::failing(DeviceError::NoDeviceFound));
        assert!(s.enumerate_video_inputs().await.is_empty());
    }
}
