//! Synthesized-speech playback.
//!
//! The synthesis endpoint returns an encoded audio payload (MP3 or WAV
//! depending on the server build). [`play_bytes`] decodes it with symphonia,
//! feeds the PCM through a cpal output stream, and blocks until the queue
//! drains — the async caller runs it on the blocking thread pool. The output
//! stream is dropped on every exit path, so the hardware handle never
//! outlives a playback.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use crate::audio::downmix_to_mono;

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Errors that can occur while playing a synthesized response.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The payload could not be decoded as audio.
    #[error("failed to decode audio payload: {0}")]
    Decode(String),

    /// No output device is available on this system.
    #[error("no audio output device available")]
    NoOutputDevice,

    /// The output stream could not be built, started, or drained.
    #[error("audio output failed: {0}")]
    Stream(String),
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// A decoded payload: mono f32 PCM at the source sample rate.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Playback duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Decode an encoded audio payload into mono f32 PCM.
///
/// Container/codec detection is probed from the content itself; multi-channel
/// sources are downmixed by frame averaging.
pub fn decode_audio(payload: Vec<u8>) -> Result<DecodedAudio, PlaybackError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(payload)), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PlaybackError::Decode(format!("unsupported audio format: {e}")))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PlaybackError::Decode("no audio track in payload".into()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| PlaybackError::Decode("payload does not declare a sample rate".into()))?;
    let channels = codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| PlaybackError::Decode(format!("unsupported audio codec: {e}")))?;

    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut interleaved: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break; // end of stream
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(PlaybackError::Decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // Skip corrupt packets; a partially playable response beats none.
            Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(PlaybackError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.capacity();

        let sbuf =
            sample_buf.get_or_insert_with(|| SampleBuffer::<f32>::new(num_frames as u64, spec));
        if sbuf.capacity() < num_frames {
            *sbuf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        }

        sbuf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(sbuf.samples());
    }

    if interleaved.is_empty() {
        return Err(PlaybackError::Decode("payload contained no samples".into()));
    }

    Ok(DecodedAudio {
        samples: downmix_to_mono(&interleaved, channels as u16),
        sample_rate,
    })
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// Decode `payload` and play it to completion on the default output device.
///
/// Blocks the calling thread for the duration of playback — run it via
/// `tokio::task::spawn_blocking`. The stream handle is released before
/// returning, on success and on error.
pub fn play_bytes(payload: Vec<u8>) -> Result<(), PlaybackError> {
    let decoded = decode_audio(payload)?;
    play_pcm(&decoded)
}

/// Play decoded mono PCM through a cpal output stream until it drains.
fn play_pcm(audio: &DecodedAudio) -> Result<(), PlaybackError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(PlaybackError::NoOutputDevice)?;

    let supported = device
        .default_output_config()
        .map_err(|e| PlaybackError::Stream(e.to_string()))?;
    let channels = supported.channels().max(1);

    let config = cpal::StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(audio.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let queue: Arc<Mutex<VecDeque<f32>>> =
        Arc::new(Mutex::new(audio.samples.iter().copied().collect()));
    let queue_cb = Arc::clone(&queue);

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut q = queue_cb.lock().unwrap();
                // Mono source replicated to every output channel; silence
                // once the queue is empty.
                for frame in data.chunks_mut(channels as usize) {
                    let sample = q.pop_front().unwrap_or(0.0);
                    frame.fill(sample);
                }
            },
            |err| log::error!("playback stream error: {err}"),
            None,
        )
        .map_err(|e| PlaybackError::Stream(e.to_string()))?;

    stream
        .play()
        .map_err(|e| PlaybackError::Stream(e.to_string()))?;

    // A stalled output stream would otherwise spin this loop forever.
    let deadline = Instant::now()
        + Duration::from_secs_f32(audio.duration_secs())
        + Duration::from_secs(2);

    loop {
        let remaining = queue.lock().unwrap().len();
        if remaining == 0 {
            break;
        }
        if Instant::now() > deadline {
            return Err(PlaybackError::Stream("playback stalled".into()));
        }
        std::thread::sleep(Duration::from_millis(30));
    }

    // Let the hardware buffer play out before the stream drops.
    std::thread::sleep(Duration::from_millis(100));
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode `samples` as a WAV payload, the format every server build can
    /// produce.
    fn wav_payload(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decode_mono_wav() {
        let payload = wav_payload(&vec![1000_i16; 8_000], 16_000, 1);
        let decoded = decode_audio(payload).unwrap();

        assert_eq!(decoded.sample_rate, 16_000);
        assert_eq!(decoded.samples.len(), 8_000);
        assert!((decoded.duration_secs() - 0.5).abs() < 0.01);
    }

    #[test]
    fn decode_stereo_wav_downmixes() {
        // 1 s of stereo → 44_100 mono frames after downmix.
        let payload = wav_payload(&vec![500_i16; 88_200], 44_100, 2);
        let decoded = decode_audio(payload).unwrap();

        assert_eq!(decoded.sample_rate, 44_100);
        assert_eq!(decoded.samples.len(), 44_100);
    }

    #[test]
    fn decode_garbage_fails() {
        let err = decode_audio(vec![0xDE, 0xAD, 0xBE, 0xEF]).unwrap_err();
        assert!(matches!(err, PlaybackError::Decode(_)));
    }

    #[test]
    fn decode_empty_payload_fails() {
        assert!(matches!(
            decode_audio(Vec::new()).unwrap_err(),
            PlaybackError::Decode(_)
        ));
    }

    #[test]
    fn decode_preserves_amplitude_sign() {
        let payload = wav_payload(&[i16::MAX, i16::MIN, 0], 8_000, 1);
        let decoded = decode_audio(payload).unwrap();
        assert!(decoded.samples[0] > 0.9);
        assert!(decoded.samples[1] < -0.9);
        assert!(decoded.samples[2].abs() < 1e-3);
    }
}
