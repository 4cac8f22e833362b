//! Per-session accumulation buffer for recorded audio.
//!
//! [`RecordingBuffer`] collects the PCM fragments a capture stream delivers
//! while recording is active, in arrival order. When recording stops the
//! buffer is finalized once into a single WAV blob for upload, then cleared;
//! the buffer owns nothing after that.

use std::io::Cursor;

// ---------------------------------------------------------------------------
// RecordingBuffer
// ---------------------------------------------------------------------------

/// Ordered sequence of raw audio fragments for one recording session.
///
/// Samples are interleaved `f32` at the capture stream's native rate and
/// channel count. The buffer grows with the recording; the recorder bounds
/// the session length, not the buffer.
pub struct RecordingBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl RecordingBuffer {
    /// Create an empty buffer for a stream with the given format.
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
            channels,
        }
    }

    /// Append one captured fragment.
    pub fn push_chunk(&mut self, samples: &[f32]) {
        self.samples.extend_from_slice(samples);
    }

    /// Number of interleaved samples currently stored.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` when nothing has been captured yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Recording duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
    }

    /// Discard all captured audio.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Finalize the session into a single mono 16-bit WAV blob and clear the
    /// buffer.
    ///
    /// Multi-channel audio is downmixed by averaging each frame's channels.
    /// Returns `None` when the buffer is empty or encoding fails (in-memory
    /// WAV encoding failing is a programming error; it is logged, never
    /// panicked on).
    pub fn finalize_wav(&mut self) -> Option<Vec<u8>> {
        if self.samples.is_empty() {
            return None;
        }

        let mono = downmix_to_mono(&self.samples, self.channels);
        self.samples.clear();

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = match hound::WavWriter::new(&mut cursor, spec) {
                Ok(w) => w,
                Err(e) => {
                    log::error!("failed to start WAV encode: {e}");
                    return None;
                }
            };
            for &s in &mono {
                let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                if let Err(e) = writer.write_sample(v) {
                    log::error!("failed to encode WAV sample: {e}");
                    return None;
                }
            }
            if let Err(e) = writer.finalize() {
                log::error!("failed to finalize WAV: {e}");
                return None;
            }
        }

        Some(cursor.into_inner())
    }
}

/// Downmix interleaved multi-channel samples to mono by averaging each frame.
///
/// Mono input is returned unchanged. A trailing partial frame is dropped.
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let ch = channels as usize;
    samples
        .chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Accumulation -----------------------------------------------------

    #[test]
    fn push_appends_in_order() {
        let mut buf = RecordingBuffer::new(16_000, 1);
        buf.push_chunk(&[1.0, 2.0]);
        buf.push_chunk(&[3.0]);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn duration_accounts_for_channels() {
        let mut buf = RecordingBuffer::new(16_000, 2);
        buf.push_chunk(&vec![0.0_f32; 32_000]); // 1 s of stereo
        assert!((buf.duration_secs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn clear_discards_everything() {
        let mut buf = RecordingBuffer::new(16_000, 1);
        buf.push_chunk(&[0.5; 100]);
        buf.clear();
        assert!(buf.is_empty());
        assert!(buf.finalize_wav().is_none());
    }

    // ---- Finalize ---------------------------------------------------------

    #[test]
    fn finalize_empty_returns_none() {
        let mut buf = RecordingBuffer::new(44_100, 1);
        assert!(buf.finalize_wav().is_none());
    }

    #[test]
    fn finalize_produces_valid_mono_wav() {
        let mut buf = RecordingBuffer::new(16_000, 1);
        buf.push_chunk(&vec![0.25_f32; 16_000]);

        let wav = buf.finalize_wav().expect("non-empty buffer");
        assert!(buf.is_empty(), "finalize must clear the buffer");

        let reader = hound::WavReader::new(Cursor::new(wav)).expect("valid WAV");
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 16_000);
    }

    #[test]
    fn finalize_downmixes_stereo() {
        let mut buf = RecordingBuffer::new(8_000, 2);
        // L = 1.0, R = 0.0 → mono ≈ 0.5
        buf.push_chunk(&[1.0, 0.0, 1.0, 0.0]);

        let wav = buf.finalize_wav().expect("non-empty buffer");
        let reader = hound::WavReader::new(Cursor::new(wav)).expect("valid WAV");
        let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 2);
        let expected = (0.5 * i16::MAX as f32) as i16;
        assert!((samples[0] - expected).abs() <= 1);
    }

    #[test]
    fn finalize_clamps_out_of_range_samples() {
        let mut buf = RecordingBuffer::new(8_000, 1);
        buf.push_chunk(&[2.0, -2.0]);

        let wav = buf.finalize_wav().expect("non-empty buffer");
        let reader = hound::WavReader::new(Cursor::new(wav)).expect("valid WAV");
        let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples[0], i16::MAX);
        assert_eq!(samples[1], -i16::MAX);
    }

    // ---- downmix_to_mono --------------------------------------------------

    #[test]
    fn mono_passthrough() {
        let s = [0.1, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&s, 1), s.to_vec());
    }

    #[test]
    fn stereo_average() {
        let s = [1.0, 0.0, 0.5, 0.5];
        assert_eq!(downmix_to_mono(&s, 2), vec![0.5, 0.5]);
    }

    #[test]
    fn partial_trailing_frame_dropped() {
        let s = [1.0, 0.0, 0.7];
        assert_eq!(downmix_to_mono(&s, 2), vec![0.5]);
    }
}
