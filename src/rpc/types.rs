//! JSON-RPC types for the daemon protocol.

use serde::{Deserialize, Serialize};

use crate::error::{AudioError, ErrorCode};

/// JSON-RPC version constant.
pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC request ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RequestId {
    Integer(i64),
    String(String),
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Integer(id)
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        RequestId::String(id)
    }
}

/// A JSON-RPC request wrapper.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub id: RequestId,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A JSON-RPC response wrapper.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse<T: Serialize> {
    pub jsonrpc: &'static str,
    pub id: RequestId,
    pub result: T,
}

impl<T: Serialize> JsonRpcResponse<T> {
    pub fn new(id: RequestId, result: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result,
        }
    }
}

/// A JSON-RPC error response.
#[derive(Debug, Serialize)]
pub struct JsonRpcErrorResponse {
    pub jsonrpc: &'static str,
    pub id: Option<RequestId>,
    pub error: JsonRpcError,
}

impl JsonRpcErrorResponse {
    pub fn new(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            error,
        }
    }
}

/// A JSON-RPC error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonRpcErrorData>,
}

/// Extended error data for application-specific errors.
#[derive(Debug, Serialize)]
pub struct JsonRpcErrorData {
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl JsonRpcError {
    /// Creates a parse error (-32700).
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self {
            code: -32700,
            message: message.into(),
            data: None,
        }
    }

    /// Creates an invalid request error (-32600).
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a method not found error (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {}", method),
            data: None,
        }
    }

    /// Creates an invalid params error (-32602).
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: message.into(),
            data: None,
        }
    }

    /// Creates an internal error (-32603).
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            code: -32603,
            message: message.into(),
            data: None,
        }
    }

    /// Returns the application error code (-32000 and below) for `code`.
    pub fn application_code(code: ErrorCode) -> i32 {
        match code {
            ErrorCode::InvalidBase64 => -32000,
            ErrorCode::InvalidAudioFormat => -32001,
            ErrorCode::DeviceUnavailable => -32002,
            ErrorCode::PlaybackFailed => -32003,
            ErrorCode::IoFailed => -32004,
            ErrorCode::InvalidWav => -32005,
        }
    }
}

impl From<AudioError> for JsonRpcError {
    fn from(err: AudioError) -> Self {
        Self {
            code: JsonRpcError::application_code(err.code),
            message: err.code.description().to_string(),
            data: Some(JsonRpcErrorData {
                error_code: err.code.as_str().to_string(),
                details: Some(err.message),
            }),
        }
    }
}

// ============================================================================
// Conversion requests
// ============================================================================

/// Parameters for `encode_wav` and `build_payload`.
#[derive(Debug, Deserialize)]
pub struct SamplesParams {
    /// Float samples in [-1.0, 1.0]; out-of-range values are clamped.
    pub samples: Vec<f32>,

    /// Sample rate in Hz; defaults to the configured capture rate.
    pub sample_rate: Option<u32>,
}

/// Response for `encode_wav`.
#[derive(Debug, Serialize)]
pub struct EncodeWavResult {
    /// Base64 of the complete WAV file.
    pub data: String,

    /// Size of the WAV file in bytes.
    pub bytes: usize,
}

/// Parameters for `decode_pcm` and `play`.
#[derive(Debug, Deserialize)]
pub struct PcmParams {
    /// Base64 of interleaved little-endian PCM16.
    pub data: String,

    /// Sample rate in Hz; defaults to the configured playback rate.
    pub sample_rate: Option<u32>,

    /// Channel count; defaults to the configured playback channels.
    pub channels: Option<u16>,
}

/// Response for `decode_pcm`.
#[derive(Debug, Serialize)]
pub struct DecodePcmResult {
    pub sample_rate: u32,
    pub frame_count: usize,
    /// One array of float samples per channel.
    pub channels: Vec<Vec<f32>>,
}

// ============================================================================
// Playback requests
// ============================================================================

/// Outcome of a `play` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayStatus {
    /// A new sound started.
    Playing,
    /// The request carried no audio; the current sound is untouched.
    Ignored,
}

/// Response for `play`.
#[derive(Debug, Serialize)]
pub struct PlayResult {
    pub status: PlayStatus,
    pub frame_count: usize,
}

/// Response for `status`.
#[derive(Debug, Serialize)]
pub struct StatusResult {
    /// A sound is still playing.
    pub playing: bool,
    /// The output device has been opened.
    pub device: bool,
}
