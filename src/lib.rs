//! pcm-audio: PCM/WAV/base64 audio conversion helpers with a playback daemon.
//!
//! This library moves audio between the shapes a realtime speech service
//! needs: float samples from a microphone, 16-bit PCM payloads in base64,
//! WAV files, and decoded buffers handed to an output device.
//!
//! # Modules
//!
//! - [`audio`]: Base64 codec, sample conversion, WAV encoding, resampling
//! - [`playback`]: Single-sound playback controller over an output device
//! - [`rpc`]: JSON-RPC 2.0 daemon over stdio
//! - [`config`]: Runtime configuration (AudioConfig)
//! - [`error`]: Error types and codes (AudioError, ErrorCode)
//!
//! # Example
//!
//! ```rust,ignore
//! use pcm_audio::audio::{build_pcm_payload, decode_base64, decode_pcm_buffer, encode_wav};
//!
//! // Microphone samples to a WAV file and a base64 payload
//! let samples = vec![0.0, 0.5, -0.5];
//! let wav = encode_wav(&samples, 16000);
//! let payload = build_pcm_payload(&samples, 16000);
//! assert_eq!(payload.mime_type, "audio/pcm;rate=16000");
//!
//! // Payload back to a playable buffer
//! let bytes = decode_base64(&payload.data)?;
//! let buffer = decode_pcm_buffer(&bytes, 16000, 1)?;
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod playback;
pub mod rpc;

// Re-export commonly used types at crate root for convenience
pub use audio::{PcmBuffer, PcmPayload, WavAudio};
pub use config::AudioConfig;
pub use error::{AudioError, ErrorCode, Result};
pub use playback::{AudioPlatform, CpalPlatform, PlaybackController};
