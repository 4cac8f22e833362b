//! Device-failure classification and acquisition constraints.
//!
//! Every hardware acquisition in this crate — microphone via cpal, camera via
//! a [`crate::camera::CameraBackend`] — reports failures as a [`DeviceError`].
//! The four variants carry distinct human-readable messages so the UI can tell
//! "no camera on this device" apart from "camera is in use elsewhere" without
//! inspecting platform error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// DeviceError
// ---------------------------------------------------------------------------

/// Classified hardware-acquisition failure.
///
/// Constructed at the capture boundary; never propagates as a panic into the
/// caller.
#[derive(Debug, Clone, Error)]
pub enum DeviceError {
    /// No matching capture device exists on this system.
    #[error("no capture device found on this device")]
    NoDeviceFound,

    /// The platform refused access. The user must grant permission.
    #[error("device access denied — please allow camera/microphone permissions")]
    PermissionDenied,

    /// The device exists but could not be opened, typically because another
    /// application holds it.
    #[error("device is already in use by another application")]
    DeviceBusy,

    /// Anything the platform reported that does not fit the above.
    #[error("device error: {0}")]
    Unknown(String),
}

// cpal does not distinguish permission failures; the closest signals are
// "device not available" (taken while enumerable → busy) and backend-specific
// strings, which stay opaque.

impl From<cpal::DefaultStreamConfigError> for DeviceError {
    fn from(e: cpal::DefaultStreamConfigError) -> Self {
        match e {
            cpal::DefaultStreamConfigError::DeviceNotAvailable => DeviceError::DeviceBusy,
            cpal::DefaultStreamConfigError::StreamTypeNotSupported => {
                DeviceError::Unknown("stream type not supported".into())
            }
            cpal::DefaultStreamConfigError::BackendSpecific { err } => {
                DeviceError::Unknown(err.description)
            }
        }
    }
}

impl From<cpal::BuildStreamError> for DeviceError {
    fn from(e: cpal::BuildStreamError) -> Self {
        match e {
            cpal::BuildStreamError::DeviceNotAvailable => DeviceError::DeviceBusy,
            cpal::BuildStreamError::BackendSpecific { err } => DeviceError::Unknown(err.description),
            other => DeviceError::Unknown(other.to_string()),
        }
    }
}

impl From<cpal::PlayStreamError> for DeviceError {
    fn from(e: cpal::PlayStreamError) -> Self {
        match e {
            cpal::PlayStreamError::DeviceNotAvailable => DeviceError::DeviceBusy,
            cpal::PlayStreamError::BackendSpecific { err } => DeviceError::Unknown(err.description),
        }
    }
}

// ---------------------------------------------------------------------------
// Facing
// ---------------------------------------------------------------------------

/// Which way a camera points.
///
/// Field technicians scan equipment with the rear ("environment") camera by
/// default; the front ("user") camera is the switch target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    /// Front-facing camera.
    User,
    /// Rear-facing camera.
    Environment,
}

impl Facing {
    /// The other facing mode, used by camera switching.
    pub fn opposite(self) -> Self {
        match self {
            Facing::User => Facing::Environment,
            Facing::Environment => Facing::User,
        }
    }

    /// Constraint-string form (`"user"` / `"environment"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Facing::User => "user",
            Facing::Environment => "environment",
        }
    }
}

impl Default for Facing {
    fn default() -> Self {
        Facing::Environment
    }
}

// ---------------------------------------------------------------------------
// Acquisition constraints
// ---------------------------------------------------------------------------

/// Resolution and frame-rate hints passed to a camera backend.
///
/// "Ideal" values are preferences; "max" values are hard caps. Backends pick
/// the closest mode they support.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoConstraints {
    pub facing: Facing,
    pub ideal_width: u32,
    pub max_width: u32,
    pub ideal_height: u32,
    pub max_height: u32,
    pub ideal_frame_rate: u32,
    pub max_frame_rate: u32,
}

impl VideoConstraints {
    /// The default constraints with a specific facing mode.
    pub fn facing(facing: Facing) -> Self {
        Self {
            facing,
            ..Self::default()
        }
    }
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            facing: Facing::Environment,
            ideal_width: 1280,
            max_width: 1920,
            ideal_height: 720,
            max_height: 1080,
            ideal_frame_rate: 30,
            max_frame_rate: 60,
        }
    }
}

/// Microphone acquisition hints.
///
/// `sample_rate` is a preference only — cpal reports what the device
/// actually delivers and recordings carry that native rate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioConstraints {
    /// Preferred sample rate in Hz; `None` accepts the device default.
    pub sample_rate: Option<u32>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
