//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::device::{Facing, VideoConstraints};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ApiConfig
// ---------------------------------------------------------------------------

/// Settings for the remote speech services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend; the clients append `/transcription` and
    /// `/speech-synthesis`.
    pub base_url: String,
    /// Maximum seconds to wait for a response before timing out.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".into(),
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for microphone capture and the live level signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Preferred capture sample rate in Hz; `None` takes the device default.
    pub sample_rate: Option<u32>,
    /// Cadence of the level-monitor task in milliseconds (~30 Hz default,
    /// matching a display refresh well enough for a pulse indicator).
    pub level_interval_ms: u64,
    /// RMS amplitude treated as full scale when normalizing the level.
    pub level_ceiling: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: None,
            level_interval_ms: 33,
            level_ceiling: 0.35,
        }
    }
}

// ---------------------------------------------------------------------------
// CameraConfig
// ---------------------------------------------------------------------------

/// Settings for camera acquisition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Facing mode the scanner opens with.
    pub default_facing: Facing,
    pub ideal_width: u32,
    pub max_width: u32,
    pub ideal_height: u32,
    pub max_height: u32,
    pub ideal_frame_rate: u32,
    pub max_frame_rate: u32,
}

impl CameraConfig {
    /// The acquisition constraints this config describes.
    pub fn constraints(&self) -> VideoConstraints {
        VideoConstraints {
            facing: self.default_facing,
            ideal_width: self.ideal_width,
            max_width: self.max_width,
            ideal_height: self.ideal_height,
            max_height: self.max_height,
            ideal_frame_rate: self.ideal_frame_rate,
            max_frame_rate: self.max_frame_rate,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        let defaults = VideoConstraints::default();
        Self {
            default_facing: Facing::Environment,
            ideal_width: defaults.ideal_width,
            max_width: defaults.max_width,
            ideal_height: defaults.ideal_height,
            max_height: defaults.max_height,
            ideal_frame_rate: defaults.ideal_frame_rate,
            max_frame_rate: defaults.max_frame_rate,
        }
    }
}

// ---------------------------------------------------------------------------
// OcrConfig
// ---------------------------------------------------------------------------

/// Settings for the recognition engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Minimum confidence (0–100) a recognition result needs before it can
    /// be accepted without a re-scan.
    pub confidence_gate: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            confidence_gate: crate::ocr::CONFIDENCE_GATE,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use field_capture::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote speech service settings.
    pub api: ApiConfig,
    /// Microphone capture / level settings.
    pub audio: AudioConfig,
    /// Camera acquisition settings.
    pub camera: CameraConfig,
    /// Recognition engine settings.
    pub ocr: OcrConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns `true` when no `settings.toml` file exists yet.
    pub fn is_first_run() -> bool {
        !AppPaths::new().settings_file.exists()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `AppConfig` can be serialised to TOML and
    /// deserialised back without any data loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.api.base_url, loaded.api.base_url);
        assert_eq!(original.api.timeout_secs, loaded.api.timeout_secs);
        assert_eq!(original.audio.sample_rate, loaded.audio.sample_rate);
        assert_eq!(original.audio.level_interval_ms, loaded.audio.level_interval_ms);
        assert_eq!(original.audio.level_ceiling, loaded.audio.level_ceiling);
        assert_eq!(original.camera.default_facing, loaded.camera.default_facing);
        assert_eq!(original.camera.ideal_width, loaded.camera.ideal_width);
        assert_eq!(original.camera.max_frame_rate, loaded.camera.max_frame_rate);
        assert_eq!(original.ocr.confidence_gate, loaded.ocr.confidence_gate);
    }

    /// `load_from` on a non-existent path must return `Default` without
    /// error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.api.base_url, AppConfig::default().api.base_url);
        assert_eq!(config.camera.ideal_width, 1280);
    }

    /// Verify defaults match the capture profile the scanner advertises.
    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.api.base_url, "http://localhost:8080/api");
        assert_eq!(cfg.api.timeout_secs, 30);
        assert_eq!(cfg.audio.sample_rate, None);
        assert_eq!(cfg.audio.level_interval_ms, 33);
        assert_eq!(cfg.camera.default_facing, Facing::Environment);
        assert_eq!(cfg.camera.constraints(), VideoConstraints::default());
        assert_eq!(cfg.ocr.confidence_gate, 30.0);
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.api.base_url = "https://field.example.com/api".into();
        cfg.api.timeout_secs = 10;
        cfg.audio.sample_rate = Some(16_000);
        cfg.audio.level_ceiling = 0.5;
        cfg.camera.default_facing = Facing::User;
        cfg.camera.ideal_width = 640;
        cfg.ocr.confidence_gate = 55.0;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.api.base_url, "https://field.example.com/api");
        assert_eq!(loaded.api.timeout_secs, 10);
        assert_eq!(loaded.audio.sample_rate, Some(16_000));
        assert_eq!(loaded.audio.level_ceiling, 0.5);
        assert_eq!(loaded.camera.default_facing, Facing::User);
        assert_eq!(loaded.camera.constraints().ideal_width, 640);
        assert_eq!(loaded.ocr.confidence_gate, 55.0);
    }
}
