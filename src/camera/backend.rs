//! Camera capability boundary.
//!
//! The crate does not talk to camera hardware directly — platform capture
//! stacks differ too much for one implementation. [`CameraBackend`] is the
//! seam the host application fills in; [`crate::camera::CameraSession`]
//! provides all lifecycle handling on top of it.
//!
//! [`MockCameraBackend`] (under `#[cfg(test)]`) is a scriptable stand-in used
//! by the session and scanner tests.

use async_trait::async_trait;

use crate::device::{DeviceError, Facing, VideoConstraints};

// ---------------------------------------------------------------------------
// Frame / CameraInfo
// ---------------------------------------------------------------------------

/// One still frame from the preview stream: tightly packed RGB8.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// `width * height * 3` bytes, row-major RGB.
    pub rgb: Vec<u8>,
}

/// A camera device entry from enumeration, for multi-camera pickers.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    /// Backend-specific stable identifier.
    pub id: String,
    /// Human-readable device name.
    pub label: String,
    /// Facing mode when the backend can tell; `None` otherwise.
    pub facing: Option<Facing>,
}

// ---------------------------------------------------------------------------
// CameraStream
// ---------------------------------------------------------------------------

/// A live camera stream.
///
/// Implementations must be `Send` so the stream can be owned by an async
/// session. `stop` must be idempotent — the session calls it defensively on
/// release and on drop.
pub trait CameraStream: Send + std::fmt::Debug {
    /// Snapshot the current preview frame.
    ///
    /// Fails once the stream has been stopped.
    fn capture_frame(&mut self) -> Result<Frame, DeviceError>;

    /// Which way this stream's camera points.
    fn facing(&self) -> Facing;

    /// `false` after [`stop`](Self::stop).
    fn is_active(&self) -> bool;

    /// Stop every track of the stream. Calling on a stopped stream is a
    /// no-op.
    fn stop(&mut self);
}

// ---------------------------------------------------------------------------
// CameraBackend
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe camera acquisition interface.
///
/// # Contract
///
/// - `open` acquires a live stream honoring `constraints` as hints and maps
///   every platform failure into a classified [`DeviceError`]; it must not
///   panic.
/// - `enumerate` lists available video inputs; backends that cannot
///   enumerate return an error, which the session converts to an empty list.
#[async_trait]
pub trait CameraBackend: Send + Sync {
    /// Acquire a live stream with the preferred facing and resolution hints.
    async fn open(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn CameraStream>, DeviceError>;

    /// List available camera devices.
    async fn enumerate(&self) -> Result<Vec<CameraInfo>, DeviceError>;
}

// Compile-time assertion: Box<dyn CameraBackend> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn CameraBackend>) {}
};

// ---------------------------------------------------------------------------
// MockCameraBackend  (test-only)
// ---------------------------------------------------------------------------

/// A scriptable camera backend for tests.
///
/// Produces solid-gray frames; individual facing modes can be configured to
/// fail so switch-fallback paths are testable. Every `open` call is logged so
/// tests can assert the acquisition sequence.
#[cfg(test)]
pub struct MockCameraBackend {
    fail_facings: Vec<Facing>,
    fail_all: Option<DeviceError>,
    /// Facing of every `open` call, in order.
    pub opened: std::sync::Mutex<Vec<Facing>>,
}

#[cfg(test)]
impl MockCameraBackend {
    /// A backend where every acquisition succeeds.
    pub fn ok() -> Self {
        Self {
            fail_facings: Vec::new(),
            fail_all: None,
            opened: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// A backend where every acquisition fails with `error`.
    pub fn failing(error: DeviceError) -> Self {
        Self {
            fail_all: Some(error),
            ..Self::ok()
        }
    }

    /// A backend where acquiring `facing` fails with `DeviceBusy` but the
    /// other facing succeeds.
    pub fn fail_facing(facing: Facing) -> Self {
        Self {
            fail_facings: vec![facing],
            ..Self::ok()
        }
    }
}

#[cfg(test)]
#[derive(Debug)]
pub struct MockCameraStream {
    facing: Facing,
    active: bool,
}

#[cfg(test)]
impl CameraStream for MockCameraStream {
    fn capture_frame(&mut self) -> Result<Frame, DeviceError> {
        if !self.active {
            return Err(DeviceError::Unknown("stream stopped".into()));
        }
        Ok(Frame {
            width: 4,
            height: 4,
            rgb: vec![128; 4 * 4 * 3],
        })
    }

    fn facing(&self) -> Facing {
        self.facing
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn stop(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
#[async_trait]
impl CameraBackend for MockCameraBackend {
    async fn open(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn CameraStream>, DeviceError> {
        self.opened.lock().unwrap().push(constraints.facing);

        if let Some(e) = &self.fail_all {
            return Err(e.clone());
        }
        if self.fail_facings.contains(&constraints.facing) {
            return Err(DeviceError::DeviceBusy);
        }
        Ok(Box::new(MockCameraStream {
            facing: constraints.facing,
            active: true,
        }))
    }

    async fn enumerate(&self) -> Result<Vec<CameraInfo>, DeviceError> {
        if let Some(e) = &self.fail_all {
            return Err(e.clone());
        }
        Ok(vec![
            CameraInfo {
                id: "cam-0".into(),
                label: "Back Camera".into(),
                facing: Some(Facing::Environment),
            },
            CameraInfo {
                id: "cam-1".into(),
                label: "Front Camera".into(),
                facing: Some(Facing::User),
            },
        ])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_open_logs_facing() {
        let backend = MockCameraBackend::ok();
        let _ = backend
            .open(&VideoConstraints::facing(Facing::User))
            .await
            .unwrap();
        assert_eq!(*backend.opened.lock().unwrap(), vec![Facing::User]);
    }

    #[tokio::test]
    async fn mock_stream_stops_idempotently() {
        let backend = MockCameraBackend::ok();
        let mut stream = backend.open(&VideoConstraints::default()).await.unwrap();

        assert!(stream.is_active());
        stream.stop();
        stream.stop(); // second stop is a no-op
        assert!(!stream.is_active());
        assert!(stream.capture_frame().is_err());
    }

    #[tokio::test]
    async fn mock_failing_backend_returns_configured_error() {
        let backend = MockCameraBackend::failing(DeviceError::PermissionDenied);
        let err = backend
            .open(&VideoConstraints::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::PermissionDenied));
    }

    #[test]
    fn box_dyn_camera_backend_compiles() {
        // If this test compiles, the trait is object-safe.
        let _backend: Box<dyn CameraBackend> = Box::new(MockCameraBackend::ok());
    }
}
