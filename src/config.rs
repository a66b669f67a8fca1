//! Runtime configuration.
//!
//! Default sample rates and channel layout for payloads and playback, plus
//! where converted WAV files go when no output path is given.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default rate for incoming PCM handed to playback (speech synthesis output).
pub const DEFAULT_PLAYBACK_RATE: u32 = 24000;

/// Default rate for outgoing payloads and WAV conversion (microphone capture).
pub const DEFAULT_CAPTURE_RATE: u32 = 16000;

/// Default channel count for incoming PCM.
pub const DEFAULT_PLAYBACK_CHANNELS: u16 = 1;

/// Highest accepted channel count.
pub const MAX_CHANNELS: u16 = 8;

/// Highest accepted sample rate in Hz.
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Runtime configuration.
///
/// Loaded from environment variables at startup; command-line flags
/// override individual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate assumed for PCM sent to playback.
    pub playback_rate: u32,

    /// Channel count assumed for PCM sent to playback.
    pub playback_channels: u16,

    /// Sample rate used for payloads and WAV conversion.
    pub capture_rate: u32,

    /// Directory for converted WAV files.
    /// If None, uses the platform-specific default cache location.
    pub output_dir: Option<PathBuf>,
}

impl AudioConfig {
    /// Creates a new AudioConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an AudioConfig from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `PCM_AUDIO_PLAYBACK_RATE` - Playback sample rate in Hz
    /// - `PCM_AUDIO_PLAYBACK_CHANNELS` - Playback channel count (1-8)
    /// - `PCM_AUDIO_CAPTURE_RATE` - Payload/WAV sample rate in Hz
    /// - `PCM_AUDIO_OUTPUT_DIR` - Directory for converted WAV files
    ///
    /// Falls back to defaults for unset or invalid variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(rate) = lookup("PCM_AUDIO_PLAYBACK_RATE").and_then(|s| parse_rate(&s)) {
            config.playback_rate = rate;
        }

        if let Some(channels_str) = lookup("PCM_AUDIO_PLAYBACK_CHANNELS") {
            if let Ok(channels) = channels_str.trim().parse::<u16>() {
                if (1..=MAX_CHANNELS).contains(&channels) {
                    config.playback_channels = channels;
                }
            }
        }

        if let Some(rate) = lookup("PCM_AUDIO_CAPTURE_RATE").and_then(|s| parse_rate(&s)) {
            config.capture_rate = rate;
        }

        if let Some(path) = lookup("PCM_AUDIO_OUTPUT_DIR") {
            if !path.is_empty() {
                config.output_dir = Some(PathBuf::from(path));
            }
        }

        config
    }

    /// Returns the effective output directory, using platform defaults if not specified.
    pub fn effective_output_dir(&self) -> PathBuf {
        if let Some(ref path) = self.output_dir {
            path.clone()
        } else {
            default_output_dir()
        }
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        for (name, rate) in [
            ("playback_rate", self.playback_rate),
            ("capture_rate", self.capture_rate),
        ] {
            if rate == 0 {
                return Some(format!("{} must be > 0", name));
            }
            if rate > MAX_SAMPLE_RATE {
                return Some(format!("{} too high: {} (max {})", name, rate, MAX_SAMPLE_RATE));
            }
        }

        if self.playback_channels == 0 || self.playback_channels > MAX_CHANNELS {
            return Some(format!(
                "playback_channels must be between 1 and {}",
                MAX_CHANNELS
            ));
        }

        None
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            playback_rate: DEFAULT_PLAYBACK_RATE,
            playback_channels: DEFAULT_PLAYBACK_CHANNELS,
            capture_rate: DEFAULT_CAPTURE_RATE,
            output_dir: None,
        }
    }
}

fn parse_rate(s: &str) -> Option<u32> {
    s.trim()
        .parse::<u32>()
        .ok()
        .filter(|rate| (1..=MAX_SAMPLE_RATE).contains(rate))
}

/// Returns the platform-specific default output directory.
///
/// Uses the `directories` crate to find appropriate locations:
/// - macOS: ~/Library/Caches/pcm-audio/wav
/// - Linux: ~/.cache/pcm-audio/wav
/// - Windows: C:\Users\<user>\AppData\Local\pcm-audio\cache\wav
pub fn default_output_dir() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "pcm-audio") {
        proj_dirs.cache_dir().join("wav")
    } else {
        // Fallback to current directory
        PathBuf::from(".")
    }
}
