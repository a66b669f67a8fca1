//! WAV container encoding and decoding.
//!
//! Encoding writes the canonical 44-byte RIFF/WAVE header by hand so the
//! output layout is fixed byte for byte. Reading goes through hound.

use std::path::Path;

use hound::{SampleFormat, WavReader};

use super::sample::float_to_pcm16;
use crate::error::{AudioError, Result};

/// Size of the RIFF/WAVE header written by [`encode_wav`].
pub const WAV_HEADER_LEN: usize = 44;

/// Bit depth of every encoded WAV.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Channel count used by [`encode_wav`].
pub const CHANNELS: u16 = 1;

/// PCM format tag in the fmt chunk.
const FORMAT_PCM: u16 = 1;

/// Size of the fmt chunk body.
const FMT_CHUNK_LEN: u32 = 16;

/// Encodes float samples as a mono 16-bit PCM WAV file.
///
/// The result is always `44 + 2 * samples.len()` bytes long.
///
/// # Example
///
/// ```ignore
/// use pcm_audio::audio::encode_wav;
///
/// let wav = encode_wav(&[0.0, 0.5, -0.5, 0.0], 16000);
/// assert_eq!(wav.len(), 44 + 8);
/// ```
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let pcm: Vec<i16> = samples.iter().copied().map(float_to_pcm16).collect();
    encode_wav_pcm16(&pcm, sample_rate, CHANNELS)
}

/// Encodes interleaved PCM16 samples as a 16-bit PCM WAV file.
///
/// Header fields that do not fit their width wrap, so any rate and channel
/// count produce a file.
pub fn encode_wav_pcm16(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bytes_per_sample = u64::from(BITS_PER_SAMPLE / 8);
    let byte_rate = (u64::from(sample_rate) * u64::from(channels) * bytes_per_sample) as u32;
    let block_align = (u64::from(channels) * bytes_per_sample) as u16;
    let data_len = (samples.len() * 2) as u32;

    let mut buf = Vec::with_capacity(WAV_HEADER_LEN + samples.len() * 2);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&data_len.wrapping_add(36).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    buf.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

/// Writes float samples to a mono 16-bit WAV file.
pub fn write_wav(samples: &[f32], path: &Path, sample_rate: u32) -> Result<()> {
    std::fs::write(path, encode_wav(samples, sample_rate)).map_err(|e| AudioError::io(path, e))
}

/// 16-bit PCM audio read from a WAV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavAudio {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Interleaved samples.
    pub samples: Vec<i16>,
}

impl WavAudio {
    /// Number of frames (samples per channel).
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Mixes all channels down to one by averaging each frame.
    pub fn mono(&self) -> Vec<i16> {
        let channels = self.channels.max(1) as usize;
        if channels == 1 {
            return self.samples.clone();
        }
        self.samples
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    }
}

/// Reads a 16-bit integer PCM WAV file.
pub fn read_wav(path: &Path) -> Result<WavAudio> {
    let reader = WavReader::open(path).map_err(|e| match e {
        hound::Error::IoError(io) => AudioError::io(path, io),
        other => AudioError::invalid_wav(format!("{}: {}", path.display(), other)),
    })?;
    read_wav_from(reader)
}

/// Reads a 16-bit integer PCM WAV file from memory.
pub fn decode_wav(bytes: &[u8]) -> Result<WavAudio> {
    let reader = WavReader::new(std::io::Cursor::new(bytes))
        .map_err(|e| AudioError::invalid_wav(e.to_string()))?;
    read_wav_from(reader)
}

fn read_wav_from<R: std::io::Read>(reader: WavReader<R>) -> Result<WavAudio> {
    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != BITS_PER_SAMPLE {
        return Err(AudioError::invalid_wav(format!(
            "expected 16-bit integer PCM, found {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let samples = reader
        .into_samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| AudioError::invalid_wav(format!("Failed to read sample: {}", e)))?;

    Ok(WavAudio {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        samples,
    })
}

/// Calculates the duration of audio in seconds from sample count.
pub fn samples_to_duration(sample_count: usize, sample_rate: u32) -> f32 {
    if sample_rate == 0 {
        return 0.0;
    }
    sample_count as f32 / sample_rate as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tempfile::tempdir;

    fn u16_at(buf: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([buf[offset], buf[offset + 1]])
    }

    fn u32_at(buf: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
    }

    #[test]
    fn encode_wav_length() {
        for n in [0usize, 1, 2, 7, 1000] {
            let samples = vec![0.1f32; n];
            assert_eq!(encode_wav(&samples, 16000).len(), 44 + 2 * n);
        }
    }

    #[test]
    fn encode_wav_header_fields() {
        let buf = encode_wav(&[0.0, 0.5, -0.5], 24000);

        assert_eq!(&buf[0..4], b"RIFF");
        assert_eq!(u32_at(&buf, 4), 36 + 6);
        assert_eq!(&buf[8..12], b"WAVE");
        assert_eq!(&buf[12..16], b"fmt ");
        assert_eq!(u32_at(&buf, 16), 16);
        assert_eq!(u16_at(&buf, 20), 1);
        assert_eq!(u16_at(&buf, 22), 1);
        assert_eq!(u32_at(&buf, 24), 24000);
        assert_eq!(u32_at(&buf, 28), 48000);
        assert_eq!(u16_at(&buf, 32), 2);
        assert_eq!(u16_at(&buf, 34), 16);
        assert_eq!(&buf[36..40], b"data");
        assert_eq!(u32_at(&buf, 40), 6);
    }

    #[test]
    fn encode_wav_empty_has_header_only() {
        let buf = encode_wav(&[], 16000);
        assert_eq!(buf.len(), WAV_HEADER_LEN);
        assert_eq!(u32_at(&buf, 4), 36);
        assert_eq!(u32_at(&buf, 40), 0);
    }

    #[test]
    fn encode_wav_quantizes_and_clamps() {
        let buf = encode_wav(&[1.0, -1.0, 0.0, 2.0, -3.0], 8000);
        let data: Vec<i16> = buf[44..]
            .chunks_exact(2)
            .map(|p| i16::from_le_bytes([p[0], p[1]]))
            .collect();
        assert_eq!(data, vec![32767, -32768, 0, 32767, -32768]);
    }

    #[test]
    fn encode_wav_pcm16_multichannel_header() {
        let buf = encode_wav_pcm16(&[1, 2, 3, 4], 48000, 2);
        assert_eq!(u16_at(&buf, 22), 2);
        assert_eq!(u32_at(&buf, 28), 192000);
        assert_eq!(u16_at(&buf, 32), 4);
        assert_eq!(u32_at(&buf, 40), 8);
    }

    #[test]
    fn encode_wav_header_wraps_huge_rates() {
        let buf = encode_wav(&[0.0], u32::MAX);
        assert_eq!(buf.len(), 46);
        assert_eq!(u32_at(&buf, 24), u32::MAX);
        assert_eq!(u32_at(&buf, 28), u32::MAX.wrapping_mul(2));

        let buf = encode_wav_pcm16(&[], 300_000_000, u16::MAX);
        let expected = (300_000_000u64 * u64::from(u16::MAX) * 2) as u32;
        assert_eq!(u32_at(&buf, 28), expected);
        assert_eq!(u16_at(&buf, 32), u16::MAX.wrapping_mul(2));
    }

    #[test]
    fn encoded_wav_is_readable_by_hound() {
        let buf = encode_wav(&[0.0, 0.5, -0.5, 1.0], 16000);
        let reader = WavReader::new(std::io::Cursor::new(buf)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, SampleFormat::Int);

        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 16383, -16384, 32767]);
    }

    #[test]
    fn write_and_read_wav_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wav");

        write_wav(&[0.0, -1.0, 1.0], &path, 22050).unwrap();
        assert!(path.exists());

        let audio = read_wav(&path).unwrap();
        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.samples, vec![0, -32768, 32767]);
        assert_eq!(audio.frame_count(), 3);
    }

    #[test]
    fn read_wav_missing_file() {
        let dir = tempdir().unwrap();
        let err = read_wav(&dir.path().join("missing.wav")).unwrap_err();
        assert_eq!(err.code, ErrorCode::IoFailed);
    }

    #[test]
    fn read_wav_rejects_float_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 32000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.25f32).unwrap();
        writer.finalize().unwrap();

        let err = read_wav(&path).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidWav);
    }

    #[test]
    fn decode_wav_rejects_garbage() {
        let err = decode_wav(b"definitely not a wav file").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidWav);
    }

    #[test]
    fn samples_to_duration_calculation() {
        assert_eq!(samples_to_duration(32000, 32000), 1.0);
        assert_eq!(samples_to_duration(48000, 24000), 2.0);
        assert_eq!(samples_to_duration(8000, 16000), 0.5);
        assert_eq!(samples_to_duration(100, 0), 0.0);
    }

    #[test]
    fn mono_mixdown_averages_frames() {
        let stereo = WavAudio {
            sample_rate: 8000,
            channels: 2,
            samples: vec![100, 300, -32768, -32768, 32767, 32767, 7],
        };
        assert_eq!(stereo.frame_count(), 3);
        assert_eq!(stereo.mono(), vec![200, -32768, 32767]);

        let mono = WavAudio {
            sample_rate: 8000,
            channels: 1,
            samples: vec![1, 2, 3],
        };
        assert_eq!(mono.mono(), vec![1, 2, 3]);
    }
}
