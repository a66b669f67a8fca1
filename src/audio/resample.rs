//! Sample-rate conversion for decoded buffers.
//!
//! Output devices rarely run at the rate a payload was produced at
//! (24 kHz speech vs. 48 kHz hardware), so buffers are converted with
//! rubato's FFT resampler before they are handed to the device.

use rubato::{FftFixedIn, Resampler};

use super::sample::PcmBuffer;
use crate::error::{AudioError, Result};

/// Input frames fed to the resampler per call.
const CHUNK_FRAMES: usize = 1024;

/// Sub-chunks per FFT chunk (lower latency, slightly more work).
const SUB_CHUNKS: usize = 2;

/// Converts `buffer` to `target_rate`.
///
/// The output frame count is `frames * target_rate / source_rate`, with the
/// resampler delay removed. Buffers already at the target rate are returned
/// unchanged.
pub fn resample(buffer: &PcmBuffer, target_rate: u32) -> Result<PcmBuffer> {
    if target_rate == 0 {
        return Err(AudioError::invalid_audio_format("target sample rate is 0"));
    }

    let source_rate = buffer.sample_rate();
    let frames = buffer.frame_count();
    if source_rate == target_rate || frames == 0 {
        return PcmBuffer::from_channels(target_rate, buffer.channels().to_vec());
    }

    let channel_count = buffer.channel_count();
    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        CHUNK_FRAMES,
        SUB_CHUNKS,
        channel_count,
    )
    .map_err(|e| AudioError::playback_failed(format!("Failed to create resampler: {}", e)))?;

    let delay = resampler.output_delay();
    let expected = (frames as u64 * target_rate as u64 / source_rate as u64) as usize;
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay); channel_count];

    let mut position = 0;
    while position + resampler.input_frames_next() <= frames {
        let take = resampler.input_frames_next();
        let chunk: Vec<&[f32]> = buffer
            .channels()
            .iter()
            .map(|c| &c[position..position + take])
            .collect();
        let processed = resampler
            .process(&chunk[..], None)
            .map_err(|e| AudioError::playback_failed(format!("Resampling failed: {}", e)))?;
        append(&mut output, processed);
        position += take;
    }

    if position < frames {
        let tail: Vec<&[f32]> = buffer.channels().iter().map(|c| &c[position..]).collect();
        let processed = resampler
            .process_partial(Some(&tail[..]), None)
            .map_err(|e| AudioError::playback_failed(format!("Resampling failed: {}", e)))?;
        append(&mut output, processed);
    }

    // Flush the delay line
    while output[0].len() < expected + delay {
        let processed = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| AudioError::playback_failed(format!("Resampling failed: {}", e)))?;
        if processed[0].is_empty() {
            break;
        }
        append(&mut output, processed);
    }

    for channel in &mut output {
        channel.drain(..delay.min(channel.len()));
        channel.resize(expected, 0.0);
    }

    PcmBuffer::from_channels(target_rate, output)
}

fn append(output: &mut [Vec<f32>], processed: Vec<Vec<f32>>) {
    for (out, chunk) in output.iter_mut().zip(processed) {
        out.extend_from_slice(&chunk);
    }
}
