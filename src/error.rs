//! Error types for pcm-audio.
//!
//! Defines the error codes and the error type shared by the conversion
//! helpers, the playback controller and the JSON-RPC layer.

use std::fmt;

/// Error codes reported by conversions and playback.
///
/// These codes are also surfaced in JSON-RPC error responses so that
/// clients can react to specific conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Input text is not valid base64.
    /// Trigger: characters outside the standard alphabet, bad padding.
    InvalidBase64,

    /// PCM shape parameters are unusable.
    /// Trigger: zero channel count or zero sample rate.
    InvalidAudioFormat,

    /// No audio output device could be opened.
    /// Trigger: headless host, device busy, unsupported configuration.
    DeviceUnavailable,

    /// The output device rejected a sound source.
    /// Trigger: stream build or start failure, resampler failure.
    PlaybackFailed,

    /// Reading or writing a file failed.
    IoFailed,

    /// A WAV file could not be read as 16-bit integer PCM.
    InvalidWav,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidBase64 => "INVALID_BASE64",
            ErrorCode::InvalidAudioFormat => "INVALID_AUDIO_FORMAT",
            ErrorCode::DeviceUnavailable => "DEVICE_UNAVAILABLE",
            ErrorCode::PlaybackFailed => "PLAYBACK_FAILED",
            ErrorCode::IoFailed => "IO_FAILED",
            ErrorCode::InvalidWav => "INVALID_WAV",
        }
    }

    /// Returns a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::InvalidBase64 => "Input is not valid base64 text",
            ErrorCode::InvalidAudioFormat => "Sample rate and channel count must be non-zero",
            ErrorCode::DeviceUnavailable => "No audio output device is available",
            ErrorCode::PlaybackFailed => "The output device failed to play the sound",
            ErrorCode::IoFailed => "File could not be read or written",
            ErrorCode::InvalidWav => "File is not a 16-bit integer PCM WAV file",
        }
    }

    /// Returns a recovery hint suggesting how to resolve this error.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCode::InvalidBase64 => {
                "Send standard base64 (A-Z, a-z, 0-9, '+', '/') with '=' padding"
            }
            ErrorCode::InvalidAudioFormat => {
                "Pass a sample rate in Hz (e.g. 24000) and at least one channel"
            }
            ErrorCode::DeviceUnavailable => {
                "Check that an output device is connected and not held exclusively \
                 by another application"
            }
            ErrorCode::PlaybackFailed => {
                "Retry playback, or try a sample rate the output device supports \
                 (44100 or 48000)"
            }
            ErrorCode::IoFailed => "Check the path exists and is readable/writable",
            ErrorCode::InvalidWav => {
                "Convert the file to 16-bit PCM first (e.g. with --to-wav from raw PCM)"
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for audio operations.
#[derive(Debug)]
pub struct AudioError {
    /// The error code identifying the type of error.
    pub code: ErrorCode,
    /// Human-readable error message with context.
    pub message: String,
    /// Optional underlying cause of the error.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AudioError {
    /// Creates a new AudioError with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new AudioError with an underlying cause.
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an INVALID_BASE64 error.
    pub fn invalid_base64(source: base64::DecodeError) -> Self {
        Self::with_source(
            ErrorCode::InvalidBase64,
            format!("Invalid base64 input: {}", source),
            source,
        )
    }

    /// Creates an INVALID_AUDIO_FORMAT error.
    pub fn invalid_audio_format(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidAudioFormat,
            format!("Invalid audio format: {}", reason.into()),
        )
    }

    /// Creates a DEVICE_UNAVAILABLE error.
    pub fn device_unavailable(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::DeviceUnavailable,
            format!("Output device unavailable: {}", reason.into()),
        )
    }

    /// Creates a PLAYBACK_FAILED error.
    pub fn playback_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::PlaybackFailed,
            format!("Playback failed: {}", reason.into()),
        )
    }

    /// Creates an IO_FAILED error for the given path.
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::with_source(
            ErrorCode::IoFailed,
            format!("{}: {}", path.as_ref().display(), source),
            source,
        )
    }

    /// Creates an INVALID_WAV error.
    pub fn invalid_wav(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidWav,
            format!("Invalid WAV file: {}", reason.into()),
        )
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}. Recovery: {}",
            self.code,
            self.message,
            self.code.recovery_hint()
        )
    }
}

impl std::error::Error for AudioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result type alias using AudioError.
pub type Result<T> = std::result::Result<T, AudioError>;
