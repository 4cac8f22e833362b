//! Microphone acquisition via `cpal`.
//!
//! [`AudioCapture`] wraps the cpal host/device/stream lifecycle. Call
//! [`AudioCapture::start`] to begin streaming [`AudioChunk`]s over an mpsc
//! channel. The returned [`StreamHandle`] is a RAII guard — dropping it stops
//! the underlying hardware stream and releases the microphone, which is the
//! crate's audio media-session teardown.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;

use crate::device::{AudioConstraints, DeviceError};

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// A single buffer of raw audio as delivered by the cpal callback.
///
/// Samples are interleaved `f32` in the range `[-1.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Interleaved PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate of this chunk in Hz (e.g. 44100, 48000).
    pub sample_rate: u32,
    /// Number of interleaved channels (1 = mono, 2 = stereo, …).
    pub channels: u16,
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal input stream alive.
///
/// Dropping this value stops the underlying hardware stream; the capture
/// channel's sender is dropped with it, so the receiving side observes
/// end-of-stream. A handle cannot be dropped twice, which makes release
/// idempotent by construction.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// Microphone capture wrapper built on top of `cpal`.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::mpsc;
/// use field_capture::audio::{AudioCapture, AudioChunk};
/// use field_capture::device::AudioConstraints;
///
/// let (tx, rx) = mpsc::channel::<AudioChunk>();
/// let capture = AudioCapture::acquire(&AudioConstraints::default()).unwrap();
/// let _handle = capture.start(tx).unwrap();
/// // `_handle` keeps the stream alive; drop it to stop recording.
/// ```
pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    /// Sample rate the stream is configured for (Hz).
    sample_rate: u32,
    /// Number of interleaved channels reported by the device.
    channels: u16,
}

impl AudioCapture {
    /// Acquire the system default input device.
    ///
    /// The device's preferred stream configuration is queried so no manual
    /// setup is required; `constraints.sample_rate` overrides the device
    /// default when set.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::NoDeviceFound`] when no input device is
    /// available, or the classified platform failure when the device cannot
    /// report a configuration.
    pub fn acquire(constraints: &AudioConstraints) -> Result<Self, DeviceError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(DeviceError::NoDeviceFound)?;

        let supported = device.default_input_config()?;

        let channels = supported.channels();
        let mut sample_rate = supported.sample_rate().0;
        let mut config: cpal::StreamConfig = supported.into();

        if let Some(preferred) = constraints.sample_rate {
            if preferred != sample_rate {
                config.sample_rate = cpal::SampleRate(preferred);
                sample_rate = preferred;
            }
        }

        Ok(Self {
            device,
            config,
            sample_rate,
            channels,
        })
    }

    /// Start recording and send [`AudioChunk`]s to `tx`.
    ///
    /// The cpal callback runs on a dedicated audio thread; each time the
    /// hardware delivers a buffer the raw `f32` samples are wrapped in an
    /// [`AudioChunk`] and forwarded over the channel. Send errors (receiver
    /// dropped) are silently ignored so the audio thread never panics.
    ///
    /// # Errors
    ///
    /// Returns the classified [`DeviceError`] if the platform rejects the
    /// stream configuration or refuses to start the stream.
    pub fn start(&self, tx: mpsc::Sender<AudioChunk>) -> Result<StreamHandle, DeviceError> {
        let sample_rate = self.sample_rate;
        let channels = self.channels;

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let chunk = AudioChunk {
                    samples: data.to_vec(),
                    sample_rate,
                    channels,
                };
                // Ignore send errors; the receiver may have been dropped.
                let _ = tx.send(chunk);
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None, // no timeout
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }

    /// Sample rate of the capture stream in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels in each [`AudioChunk`].
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// `AudioChunk` must be `Send` so it can cross thread boundaries.
    #[test]
    fn audio_chunk_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<AudioChunk>();
    }

    #[test]
    fn audio_chunk_fields() {
        let chunk = AudioChunk {
            samples: vec![0.0_f32; 512],
            sample_rate: 48_000,
            channels: 2,
        };
        assert_eq!(chunk.samples.len(), 512);
        assert_eq!(chunk.sample_rate, 48_000);
        assert_eq!(chunk.channels, 2);
    }
}
