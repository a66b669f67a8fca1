//! Sample conversion between float and 16-bit PCM.
//!
//! Float samples live in [-1.0, 1.0]. Quantization scales negative values
//! by 32768 and non-negative values by 32767, while dequantization always
//! divides by 32768. The two directions are therefore not exact inverses;
//! encoded streams depend on this exact mapping.
//!
//! Outgoing payloads use a different, symmetric scale (32767 on both sides
//! of zero) so their bytes match what existing payload consumers receive.

use serde::{Deserialize, Serialize};

use super::encoding::encode_base64;
use crate::error::{AudioError, Result};

/// Scale applied to negative samples and used for dequantization.
const NEGATIVE_SCALE: f32 = 32768.0;

/// Scale applied to non-negative samples.
const POSITIVE_SCALE: f32 = 32767.0;

/// Converts a float sample to signed 16-bit PCM.
///
/// Out-of-range input is clamped; NaN maps to silence.
pub fn float_to_pcm16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    let scaled = if clamped < 0.0 {
        clamped * NEGATIVE_SCALE
    } else {
        clamped * POSITIVE_SCALE
    };
    // `as` truncates toward zero and maps NaN to 0
    scaled as i16
}

/// Converts a float sample to signed 16-bit PCM for a payload.
///
/// Both signs scale by 32767, so -1.0 maps to -32767. Truncates toward zero.
pub fn float_to_pcm16_symmetric(sample: f32) -> i16 {
    // `as` truncates toward zero and maps NaN to 0
    (sample.clamp(-1.0, 1.0) * POSITIVE_SCALE) as i16
}

/// Converts a signed 16-bit PCM sample to float.
pub fn pcm16_to_float(sample: i16) -> f32 {
    sample as f32 / NEGATIVE_SCALE
}

/// Serializes PCM16 samples as little-endian bytes.
pub fn pcm16_to_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// Reinterprets little-endian bytes as PCM16 samples.
///
/// A trailing odd byte is ignored.
pub fn bytes_to_pcm16(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Decoded, de-interleaved audio ready for playback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PcmBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl PcmBuffer {
    /// Creates a silent buffer with the given shape.
    pub fn silent(channel_count: u16, frame_count: usize, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: vec![vec![0.0; frame_count]; channel_count as usize],
        }
    }

    /// Builds a buffer from per-channel sample vectors.
    ///
    /// All channels must have the same length and there must be at least one.
    pub fn from_channels(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        check_shape(sample_rate, channels.len())?;
        let frames = channels[0].len();
        if channels.iter().any(|c| c.len() != frames) {
            return Err(AudioError::invalid_audio_format(
                "channels have different frame counts",
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Returns the sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Returns the number of frames (samples per channel).
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Returns the samples of one channel.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Returns all channels.
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Consumes the buffer, returning its channels.
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f32 {
        super::wav::samples_to_duration(self.frame_count(), self.sample_rate)
    }
}

/// Rejects a zero channel count or a zero sample rate.
pub fn check_shape(sample_rate: u32, channel_count: usize) -> Result<()> {
    if channel_count == 0 {
        return Err(AudioError::invalid_audio_format("channel count is 0"));
    }
    if sample_rate == 0 {
        return Err(AudioError::invalid_audio_format("sample rate is 0"));
    }
    Ok(())
}

/// Number of whole frames in `byte_len` bytes of interleaved PCM16.
pub fn pcm_frame_count(byte_len: usize, channel_count: u16) -> usize {
    if channel_count == 0 {
        return 0;
    }
    byte_len / 2 / channel_count as usize
}

/// De-interleaves little-endian PCM16 bytes into an allocated buffer.
///
/// Fills at most `buffer.frame_count()` frames; frames missing from `bytes`
/// are left untouched.
pub fn fill_pcm_buffer(buffer: &mut PcmBuffer, bytes: &[u8]) {
    let channel_count = buffer.channel_count();
    if channel_count == 0 {
        return;
    }
    let samples = bytes_to_pcm16(bytes);
    let frame_count = buffer.frame_count().min(samples.len() / channel_count);

    for (channel, data) in buffer.channels.iter_mut().enumerate() {
        for (frame, value) in data.iter_mut().take(frame_count).enumerate() {
            *value = pcm16_to_float(samples[frame * channel_count + channel]);
        }
    }
}

/// Decodes interleaved little-endian PCM16 bytes into a [`PcmBuffer`].
///
/// The frame count is `samples / channel_count`; a trailing odd byte and a
/// trailing partial frame are dropped.
pub fn decode_pcm_buffer(bytes: &[u8], sample_rate: u32, channel_count: u16) -> Result<PcmBuffer> {
    check_shape(sample_rate, channel_count as usize)?;

    let frame_count = pcm_frame_count(bytes.len(), channel_count);
    let mut buffer = PcmBuffer::silent(channel_count, frame_count, sample_rate);
    fill_pcm_buffer(&mut buffer, bytes);
    Ok(buffer)
}

/// Base64 PCM16 payload tagged with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PcmPayload {
    /// Base64 of little-endian PCM16 samples.
    pub data: String,
    /// `audio/pcm;rate=<sample_rate>`.
    pub mime_type: String,
}

/// Returns the MIME type for raw PCM at the given rate.
pub fn pcm_mime_type(sample_rate: u32) -> String {
    format!("audio/pcm;rate={}", sample_rate)
}

/// Quantizes float samples with the symmetric payload scale and packs them
/// into a base64 payload.
pub fn build_pcm_payload(samples: &[f32], sample_rate: u32) -> PcmPayload {
    let pcm: Vec<i16> = samples.iter().copied().map(float_to_pcm16_symmetric).collect();
    pcm16_payload(&pcm, sample_rate)
}

/// Packs already-quantized samples into a base64 payload.
pub fn pcm16_payload(samples: &[i16], sample_rate: u32) -> PcmPayload {
    PcmPayload {
        data: encode_base64(&pcm16_to_bytes(samples)),
        mime_type: pcm_mime_type(sample_rate),
    }
}
