//! JSON-RPC server over stdin/stdout.
//!
//! Implements the JSON-RPC 2.0 protocol for daemon communication.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use tracing::{debug, error, info};

use crate::config::AudioConfig;
use crate::error::{AudioError, ErrorCode, Result};
use crate::playback::{AudioPlatform, CpalPlatform, PlaybackController};

use super::methods::handle_request;
use super::types::{JsonRpcError, JsonRpcErrorResponse, JsonRpcRequest, JsonRpcResponse};

/// State shared across all request handlers.
///
/// Output streams are tied to the thread that opened them, so playback
/// runs on a current-thread runtime owned by the server loop.
pub struct ServerState<P: AudioPlatform = CpalPlatform> {
    /// Daemon configuration.
    pub config: AudioConfig,
    /// Output device and active sound.
    pub playback: PlaybackController<P>,
    runtime: Runtime,
    /// Flag to signal server shutdown.
    shutdown: Arc<AtomicBool>,
}

impl ServerState<CpalPlatform> {
    /// Creates server state that plays through the default output device.
    pub fn new(config: AudioConfig) -> Result<Self> {
        Self::with_platform(config, CpalPlatform::new())
    }
}

impl<P: AudioPlatform> ServerState<P> {
    /// Creates server state that opens devices through `platform`.
    pub fn with_platform(config: AudioConfig, platform: P) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AudioError::with_source(ErrorCode::IoFailed, "Failed to start runtime", e))?;

        Ok(Self {
            config,
            playback: PlaybackController::new(platform),
            runtime,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Plays PCM16 bytes, blocking until the new sound has started.
    pub fn play(&mut self, pcm_bytes: Vec<u8>, sample_rate: u32, channels: u16) -> Result<()> {
        self.runtime
            .block_on(self.playback.play(pcm_bytes, sample_rate, channels))
    }

    /// Signals the server to shut down.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Returns true if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

/// Runs the JSON-RPC server, reading from stdin and writing to stdout.
pub fn run_server<P: AudioPlatform>(mut state: ServerState<P>) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let reader = stdin.lock();

    info!("JSON-RPC server started, waiting for requests");

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("Error reading stdin: {}", e);
                break;
            }
        };

        // Skip empty lines
        if line.trim().is_empty() {
            continue;
        }

        let response = process_request(&line, &mut state);

        if let Some(response) = response {
            writeln!(stdout, "{}", response).ok();
            stdout.flush().ok();
        }

        if state.is_shutdown() {
            info!("Server shutdown requested");
            break;
        }
    }

    state.playback.stop_active();
    info!("JSON-RPC server stopped");
    Ok(())
}

/// Processes a single JSON-RPC request line.
fn process_request<P: AudioPlatform>(line: &str, state: &mut ServerState<P>) -> Option<String> {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            let error = JsonRpcErrorResponse::new(
                None,
                JsonRpcError::parse_error(format!("Invalid JSON: {}", e)),
            );
            return Some(serde_json::to_string(&error).unwrap_or_default());
        }
    };

    if request.jsonrpc != "2.0" {
        let error = JsonRpcErrorResponse::new(
            Some(request.id),
            JsonRpcError::invalid_request("Invalid JSON-RPC version (expected 2.0)"),
        );
        return Some(serde_json::to_string(&error).unwrap_or_default());
    }

    debug!(method = %request.method, "Handling request");

    match handle_request(&request.method, request.params, state) {
        Ok(result) => Some(
            serde_json::to_string(&JsonRpcResponse::new(request.id, result)).unwrap_or_default(),
        ),
        Err(error) => {
            debug!(method = %request.method, code = error.code, "Request failed: {}", error.message);
            Some(
                serde_json::to_string(&JsonRpcErrorResponse::new(Some(request.id), error))
                    .unwrap_or_default(),
            )
        }
    }
}
