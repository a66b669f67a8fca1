//! Audio platform backed by the host's default cpal output device.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use tracing::{debug, error};

use super::device::{AudioContext, AudioPlatform, SoundSource};
use crate::audio::{resample, PcmBuffer};
use crate::error::{AudioError, Result};

/// Opens the default output device of the default cpal host.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalPlatform;

impl CpalPlatform {
    /// Creates the platform.
    pub fn new() -> Self {
        Self
    }
}

impl AudioPlatform for CpalPlatform {
    type Context = CpalContext;

    fn create_context(&self) -> Result<CpalContext> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::device_unavailable("no default output device"))?;

        let supported = device.default_output_config().map_err(|e| {
            AudioError::device_unavailable(format!("Failed to get output config: {}", e))
        })?;

        debug!(
            device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
            sample_rate = supported.sample_rate().0,
            channels = supported.channels(),
            format = ?supported.sample_format(),
            "Opened output device"
        );

        Ok(CpalContext {
            device,
            sample_format: supported.sample_format(),
            config: supported.config(),
        })
    }
}

/// An open cpal output device.
///
/// cpal streams run independently of each other, so the context itself is
/// never suspended.
pub struct CpalContext {
    device: cpal::Device,
    sample_format: SampleFormat,
    config: StreamConfig,
}

impl CpalContext {
    /// Device sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Device channel count.
    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    fn build_stream<T>(
        &self,
        frames: Arc<[f32]>,
        cursor: Arc<AtomicUsize>,
        finished: Arc<AtomicBool>,
    ) -> Result<Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let start = cursor.load(Ordering::Relaxed);
                    let available = frames.len().saturating_sub(start);
                    let n = data.len().min(available);

                    for (out, &sample) in data.iter_mut().zip(&frames[start..start + n]) {
                        *out = T::from_sample(sample);
                    }
                    // Pad with silence once the buffer runs out
                    data[n..].fill(T::EQUILIBRIUM);

                    cursor.store(start + n, Ordering::Relaxed);
                    if start + n >= frames.len() {
                        finished.store(true, Ordering::Release);
                    }
                },
                |err| error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::playback_failed(format!("Failed to build stream: {}", e)))
    }
}

impl AudioContext for CpalContext {
    type Source = CpalSource;

    fn is_suspended(&self) -> bool {
        false
    }

    fn resume(&mut self) -> Result<()> {
        Ok(())
    }

    fn output_rate(&self) -> Option<u32> {
        Some(self.sample_rate())
    }

    fn create_source(&mut self, buffer: PcmBuffer) -> Result<CpalSource> {
        // The controller converts on the blocking pool; this covers direct callers
        let buffer = if buffer.sample_rate() == self.sample_rate() {
            buffer
        } else {
            resample(&buffer, self.sample_rate())?
        };
        let frames: Arc<[f32]> = interleave_for_device(&buffer, self.channels()).into();
        let cursor = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(frames.is_empty()));

        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(frames, cursor, finished.clone())?,
            SampleFormat::I16 => self.build_stream::<i16>(frames, cursor, finished.clone())?,
            SampleFormat::U16 => self.build_stream::<u16>(frames, cursor, finished.clone())?,
            format => {
                return Err(AudioError::playback_failed(format!(
                    "Unsupported sample format: {:?}",
                    format
                )));
            }
        };

        // Some hosts start streams on creation
        stream
            .pause()
            .map_err(|e| AudioError::playback_failed(format!("Failed to pause new stream: {}", e)))?;

        Ok(CpalSource {
            stream: Some(stream),
            finished,
            stopped: false,
        })
    }
}

/// Lays out a buffer in the device's interleaved channel order.
///
/// Device channel `c` plays buffer channel `c % channels`, so mono is copied
/// to every speaker and surplus buffer channels are dropped.
fn interleave_for_device(buffer: &PcmBuffer, device_channels: u16) -> Vec<f32> {
    let device_channels = device_channels.max(1) as usize;
    let source_channels = buffer.channels();
    let mut out = Vec::with_capacity(buffer.frame_count() * device_channels);

    for frame in 0..buffer.frame_count() {
        for channel in 0..device_channels {
            out.push(source_channels[channel % source_channels.len()][frame]);
        }
    }

    out
}

/// A one-shot cpal output stream.
pub struct CpalSource {
    stream: Option<Stream>,
    finished: Arc<AtomicBool>,
    stopped: bool,
}

impl SoundSource for CpalSource {
    fn start(&mut self) -> Result<()> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| AudioError::playback_failed("source was disconnected"))?;
        stream
            .play()
            .map_err(|e| AudioError::playback_failed(format!("Failed to start stream: {}", e)))
    }

    fn stop(&mut self) -> Result<()> {
        if self.stopped || self.is_finished() {
            return Err(AudioError::playback_failed("source is not playing"));
        }
        self.stopped = true;
        if let Some(stream) = &self.stream {
            stream
                .pause()
                .map_err(|e| AudioError::playback_failed(format!("Failed to stop stream: {}", e)))?;
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    fn disconnect(&mut self) {
        // Dropping the stream releases it from the device
        self.stream = None;
    }
}
