//! Output device abstraction used by the playback controller.
//!
//! The controller never talks to hardware directly. A platform creates a
//! context (one per output device), the context turns decoded buffers into
//! sound sources, and a source can be started and stopped once.

use crate::audio::PcmBuffer;
use crate::error::Result;

/// Entry point into an audio output platform.
pub trait AudioPlatform {
    /// Context type produced by this platform.
    type Context: AudioContext;

    /// Opens the output device.
    fn create_context(&self) -> Result<Self::Context>;
}

/// An open output device.
pub trait AudioContext {
    /// Sound source type produced by this context.
    type Source: SoundSource;

    /// Returns true if the device is paused and must be resumed before use.
    fn is_suspended(&self) -> bool;

    /// Resumes a suspended device.
    fn resume(&mut self) -> Result<()>;

    /// Rate buffers must be converted to before [`create_source`](Self::create_source),
    /// or None if the device accepts any rate.
    fn output_rate(&self) -> Option<u32> {
        None
    }

    /// Allocates an empty buffer in the device's preferred layout.
    fn create_buffer(&self, channels: u16, frame_count: usize, sample_rate: u32) -> PcmBuffer {
        PcmBuffer::silent(channels, frame_count, sample_rate)
    }

    /// Creates an unstarted source that will play `buffer` once.
    fn create_source(&mut self, buffer: PcmBuffer) -> Result<Self::Source>;
}

/// A one-shot sound bound to a context.
pub trait SoundSource {
    /// Starts playback.
    fn start(&mut self) -> Result<()>;

    /// Stops playback. Fails if the source already finished or was stopped.
    fn stop(&mut self) -> Result<()>;

    /// Returns true once every frame has been played.
    fn is_finished(&self) -> bool;

    /// Detaches the source from the device output.
    fn disconnect(&mut self);
}
