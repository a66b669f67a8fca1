//! Playback of decoded PCM through an output device.
//!
//! - [`device`]: platform/context/source traits the controller drives
//! - [`controller`]: single-sound playback controller
//! - [`cpal_backend`]: the default output device via cpal

pub mod controller;
pub mod cpal_backend;
pub mod device;

// Re-export commonly used types
pub use controller::PlaybackController;
pub use cpal_backend::{CpalContext, CpalPlatform, CpalSource};
pub use device::{AudioContext, AudioPlatform, SoundSource};
