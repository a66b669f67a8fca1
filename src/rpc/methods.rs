//! JSON-RPC method handlers.
//!
//! Implements the handlers for all supported JSON-RPC methods.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::audio::{
    build_pcm_payload, decode_base64, decode_pcm_buffer, encode_base64, encode_wav,
    pcm_frame_count,
};
use crate::config::MAX_SAMPLE_RATE;
use crate::error::AudioError;
use crate::playback::AudioPlatform;

use super::server::ServerState;
use super::types::{
    DecodePcmResult, EncodeWavResult, JsonRpcError, PcmParams, PlayResult, PlayStatus,
    SamplesParams, StatusResult,
};

/// Handles a JSON-RPC method call.
pub fn handle_request<P: AudioPlatform>(
    method: &str,
    params: serde_json::Value,
    state: &mut ServerState<P>,
) -> Result<serde_json::Value, JsonRpcError> {
    match method {
        "encode_wav" => handle_encode_wav(params, state),
        "build_payload" => handle_build_payload(params, state),
        "decode_pcm" => handle_decode_pcm(params, state),
        "play" => handle_play(params, state),
        "stop" => handle_stop(state),
        "status" => handle_status(state),
        "ping" => handle_ping(),
        "shutdown" => handle_shutdown(state),
        _ => Err(JsonRpcError::method_not_found(method)),
    }
}

fn parse_params<T: DeserializeOwned>(params: serde_json::Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))
}

fn to_value<T: Serialize>(result: T) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

/// Uses the requested rate, or `default` when none was sent.
fn resolve_rate(requested: Option<u32>, default: u32) -> Result<u32, JsonRpcError> {
    match requested {
        Some(0) => Err(AudioError::invalid_audio_format("sample rate is 0").into()),
        Some(rate) if rate > MAX_SAMPLE_RATE => Err(AudioError::invalid_audio_format(format!(
            "sample rate {} exceeds {}",
            rate, MAX_SAMPLE_RATE
        ))
        .into()),
        Some(rate) => Ok(rate),
        None => Ok(default),
    }
}

/// Handles the ping method for health checks.
fn handle_ping() -> Result<serde_json::Value, JsonRpcError> {
    Ok(serde_json::json!({ "status": "ok" }))
}

/// Handles the shutdown method.
fn handle_shutdown<P: AudioPlatform>(
    state: &mut ServerState<P>,
) -> Result<serde_json::Value, JsonRpcError> {
    state.playback.stop_active();
    state.shutdown();
    Ok(serde_json::json!({ "status": "shutting_down" }))
}

/// Wraps float samples in a mono WAV file.
fn handle_encode_wav<P: AudioPlatform>(
    params: serde_json::Value,
    state: &ServerState<P>,
) -> Result<serde_json::Value, JsonRpcError> {
    let params: SamplesParams = parse_params(params)?;
    let sample_rate = resolve_rate(params.sample_rate, state.config.capture_rate)?;

    let wav = encode_wav(&params.samples, sample_rate);
    to_value(EncodeWavResult {
        bytes: wav.len(),
        data: encode_base64(&wav),
    })
}

/// Quantizes float samples into a base64 PCM payload.
fn handle_build_payload<P: AudioPlatform>(
    params: serde_json::Value,
    state: &ServerState<P>,
) -> Result<serde_json::Value, JsonRpcError> {
    let params: SamplesParams = parse_params(params)?;
    let sample_rate = resolve_rate(params.sample_rate, state.config.capture_rate)?;

    to_value(build_pcm_payload(&params.samples, sample_rate))
}

/// Decodes a base64 PCM payload into per-channel float samples.
fn handle_decode_pcm<P: AudioPlatform>(
    params: serde_json::Value,
    state: &ServerState<P>,
) -> Result<serde_json::Value, JsonRpcError> {
    let params: PcmParams = parse_params(params)?;
    let sample_rate = resolve_rate(params.sample_rate, state.config.playback_rate)?;
    let channels = params.channels.unwrap_or(state.config.playback_channels);

    let bytes = decode_base64(&params.data)?;
    let buffer = decode_pcm_buffer(&bytes, sample_rate, channels)?;

    to_value(DecodePcmResult {
        sample_rate: buffer.sample_rate(),
        frame_count: buffer.frame_count(),
        channels: buffer.into_channels(),
    })
}

/// Plays a base64 PCM payload, replacing whatever is playing.
fn handle_play<P: AudioPlatform>(
    params: serde_json::Value,
    state: &mut ServerState<P>,
) -> Result<serde_json::Value, JsonRpcError> {
    let params: PcmParams = parse_params(params)?;
    let sample_rate = resolve_rate(params.sample_rate, state.config.playback_rate)?;
    let channels = params.channels.unwrap_or(state.config.playback_channels);

    let bytes = decode_base64(&params.data)?;
    if bytes.is_empty() {
        debug!("play request carried no audio");
        return to_value(PlayResult {
            status: PlayStatus::Ignored,
            frame_count: 0,
        });
    }

    let frame_count = pcm_frame_count(bytes.len(), channels);
    state.play(bytes, sample_rate, channels)?;

    to_value(PlayResult {
        status: PlayStatus::Playing,
        frame_count,
    })
}

/// Stops the current sound.
fn handle_stop<P: AudioPlatform>(
    state: &mut ServerState<P>,
) -> Result<serde_json::Value, JsonRpcError> {
    state.playback.stop_active();
    Ok(serde_json::json!({ "status": "stopped" }))
}

/// Reports playback state.
fn handle_status<P: AudioPlatform>(
    state: &ServerState<P>,
) -> Result<serde_json::Value, JsonRpcError> {
    to_value(StatusResult {
        playing: state.playback.is_playing(),
        device: state.playback.has_device(),
    })
}
