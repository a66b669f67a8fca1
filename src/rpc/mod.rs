//! JSON-RPC module for daemon communication.
//!
//! Provides the JSON-RPC 2.0 server implementation for:
//! - `encode_wav`: Wrap float samples in a base64 WAV file
//! - `build_payload`: Quantize float samples into a base64 PCM payload
//! - `decode_pcm`: Decode a base64 PCM payload into per-channel samples
//! - `play`: Play a base64 PCM payload, replacing the current sound
//! - `stop`: Stop the current sound
//! - `status`: Report playback state
//! - `ping`: Health check
//! - `shutdown`: Graceful shutdown

pub mod methods;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use server::{run_server, ServerState};
pub use types::{
    DecodePcmResult, EncodeWavResult, JsonRpcError, JsonRpcErrorResponse, JsonRpcRequest,
    JsonRpcResponse, PcmParams, PlayResult, PlayStatus, RequestId, SamplesParams, StatusResult,
};
