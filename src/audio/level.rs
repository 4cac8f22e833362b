//! Live audio-level signal for the recording UI.
//!
//! While recording is active the UI shows a pulsing level indicator. The
//! capture path computes the RMS energy of each arriving chunk; the monitor
//! task normalizes it against a fixed ceiling into `[0,1]` and publishes it
//! as `VoiceState::audio_level` on a fixed cadence. Nothing here persists —
//! the signal is UI-only.

// ---------------------------------------------------------------------------
// LevelMeter
// ---------------------------------------------------------------------------

/// Converts raw chunk energy into a normalized `[0,1]` level.
///
/// The ceiling is the RMS amplitude treated as "full scale". Speech rarely
/// exceeds ~0.35 RMS on consumer microphones, so normalizing against full
/// digital scale would leave the indicator nearly flat.
#[derive(Debug, Clone, Copy)]
pub struct LevelMeter {
    ceiling: f32,
}

impl LevelMeter {
    /// Create a meter with the given normalization ceiling.
    ///
    /// A non-positive ceiling falls back to `1.0` (full digital scale).
    pub fn new(ceiling: f32) -> Self {
        let ceiling = if ceiling > 0.0 { ceiling } else { 1.0 };
        Self { ceiling }
    }

    /// Normalized level of one capture chunk, clamped to `[0.0, 1.0]`.
    ///
    /// Empty input yields `0.0`.
    pub fn level(&self, samples: &[f32]) -> f32 {
        self.normalize(rms(samples))
    }

    /// Normalize an already-computed RMS value against the ceiling.
    ///
    /// The capture path computes RMS per chunk as audio arrives; the monitor
    /// task normalizes the latest value on its own cadence.
    pub fn normalize(&self, rms: f32) -> f32 {
        (rms.max(0.0) / self.ceiling).min(1.0)
    }
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new(0.35)
    }
}

/// Root-mean-square amplitude of `samples`; `0.0` for empty input.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let mean_sq: f32 = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    mean_sq.sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_is_zero() {
        let meter = LevelMeter::default();
        assert_eq!(meter.level(&vec![0.0_f32; 1_600]), 0.0);
    }

    #[test]
    fn empty_input_is_zero() {
        let meter = LevelMeter::default();
        assert_eq!(meter.level(&[]), 0.0);
    }

    #[test]
    fn full_scale_clamps_to_one() {
        let meter = LevelMeter::new(0.35);
        // Constant 1.0 → RMS 1.0, far above the ceiling.
        assert_eq!(meter.level(&vec![1.0_f32; 256]), 1.0);
    }

    #[test]
    fn level_scales_linearly_below_ceiling() {
        let meter = LevelMeter::new(0.5);
        // Constant 0.25 → RMS 0.25 → 0.25 / 0.5 = 0.5
        let level = meter.level(&vec![0.25_f32; 256]);
        assert!((level - 0.5).abs() < 1e-5, "level = {level}");
    }

    #[test]
    fn non_positive_ceiling_falls_back_to_full_scale() {
        let meter = LevelMeter::new(0.0);
        let level = meter.level(&vec![0.5_f32; 256]);
        assert!((level - 0.5).abs() < 1e-5);
    }

    #[test]
    fn normalize_matches_level_for_raw_rms() {
        let meter = LevelMeter::new(0.5);
        assert!((meter.normalize(0.25) - 0.5).abs() < 1e-6);
        assert_eq!(meter.normalize(2.0), 1.0);
        assert_eq!(meter.normalize(-0.1), 0.0);
    }

    #[test]
    fn rms_of_constant_signal() {
        assert!((rms(&[0.5, 0.5, 0.5, 0.5]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rms_ignores_sign() {
        assert!((rms(&[0.5, -0.5]) - 0.5).abs() < 1e-6);
    }
}
