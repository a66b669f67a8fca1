//! pcm-audio: PCM/WAV/base64 conversion and playback.
//!
//! This binary can run in two modes:
//! - CLI mode: one-shot playback and conversion of local files
//! - Daemon mode: JSON-RPC server for editor or service integration

use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pcm_audio::audio::{
    bytes_to_pcm16, encode_wav_pcm16, pcm16_payload, pcm16_to_bytes, pcm_frame_count, read_wav,
    samples_to_duration, CHANNELS,
};
use pcm_audio::cli::{is_wav_path, Cli};
use pcm_audio::config::AudioConfig;
use pcm_audio::error::{AudioError, ErrorCode, Result};
use pcm_audio::playback::{CpalPlatform, PlaybackController};
use pcm_audio::rpc::{run_server, ServerState};

/// How often `--play` checks whether the sound has finished.
const PLAYBACK_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Extra time `--play` waits past the sound's duration before giving up.
const PLAYBACK_SLACK: Duration = Duration::from_secs(2);

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout carries JSON-RPC responses and payload output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let mut config = AudioConfig::from_env();
    cli.apply_to(&mut config);
    if let Some(message) = config.validate() {
        return Err(AudioError::new(ErrorCode::InvalidAudioFormat, message));
    }

    if cli.is_daemon_mode() {
        run_daemon_mode(config)
    } else if cli.is_cli_mode() {
        run_cli_mode(&cli, &config)
    } else {
        print_usage();
        Ok(())
    }
}

/// Runs the one-shot command selected on the command line.
fn run_cli_mode(cli: &Cli, config: &AudioConfig) -> Result<()> {
    if let Some(ref input) = cli.play {
        run_play(input, config)
    } else if let Some(ref input) = cli.to_wav {
        run_to_wav(input, &cli.output_path(input, config), config)
    } else if let Some(ref input) = cli.payload {
        run_payload(input)
    } else {
        print_usage();
        Ok(())
    }
}

/// Plays a WAV or raw PCM16 file and waits for it to finish.
fn run_play(input: &Path, config: &AudioConfig) -> Result<()> {
    let (bytes, sample_rate, channels) = if is_wav_path(input) {
        let wav = read_wav(input)?;
        (pcm16_to_bytes(&wav.samples), wav.sample_rate, wav.channels)
    } else {
        let bytes = std::fs::read(input).map_err(|e| AudioError::io(input, e))?;
        (bytes, config.playback_rate, config.playback_channels)
    };

    let frames = pcm_frame_count(bytes.len(), channels);
    let duration_secs = samples_to_duration(frames, sample_rate);
    info!(
        file = %input.display(),
        sample_rate,
        channels,
        duration_secs,
        "Playing"
    );
    let limit = Duration::from_secs_f32(duration_secs) + PLAYBACK_SLACK;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AudioError::with_source(ErrorCode::IoFailed, "Failed to start runtime", e))?;

    runtime.block_on(async {
        let mut controller = PlaybackController::new(CpalPlatform::new());
        controller.play(bytes, sample_rate, channels).await?;
        if !controller
            .wait_until_finished(PLAYBACK_POLL_INTERVAL, limit)
            .await
        {
            warn!(limit_secs = limit.as_secs_f32(), "Playback did not finish in time, stopping");
        }
        Ok::<(), AudioError>(())
    })
}

/// Wraps a raw mono PCM16 file in a WAV container.
fn run_to_wav(input: &Path, output: &Path, config: &AudioConfig) -> Result<()> {
    let bytes = std::fs::read(input).map_err(|e| AudioError::io(input, e))?;
    if bytes.len() % 2 != 0 {
        warn!(file = %input.display(), "Dropping trailing odd byte");
    }
    let samples = bytes_to_pcm16(&bytes);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| AudioError::io(parent, e))?;
    }

    let wav = encode_wav_pcm16(&samples, config.capture_rate, CHANNELS);
    std::fs::write(output, &wav).map_err(|e| AudioError::io(output, e))?;

    info!(
        output = %output.display(),
        samples = samples.len(),
        duration_secs = samples_to_duration(samples.len(), config.capture_rate),
        "Saved WAV file"
    );
    Ok(())
}

/// Prints the JSON payload for a WAV file on stdout.
fn run_payload(input: &Path) -> Result<()> {
    let wav = read_wav(input)?;
    if wav.channels > 1 {
        info!(channels = wav.channels, "Mixing down to mono");
    }

    let payload = pcm16_payload(&wav.mono(), wav.sample_rate);
    let json = serde_json::to_string(&payload)
        .map_err(|e| AudioError::new(ErrorCode::IoFailed, format!("Failed to encode payload: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// Runs the daemon mode (JSON-RPC server).
fn run_daemon_mode(config: AudioConfig) -> Result<()> {
    info!(
        playback_rate = config.playback_rate,
        playback_channels = config.playback_channels,
        capture_rate = config.capture_rate,
        "Starting pcm-audio JSON-RPC server on stdio"
    );

    let state = ServerState::new(config)?;
    run_server(state)
}

/// Prints usage information.
fn print_usage() {
    eprintln!("pcm-audio: PCM/WAV/base64 conversion and playback");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  Play a file (WAV, or raw PCM16 with --sample-rate/--channels):");
    eprintln!("    pcm-audio --play speech.wav");
    eprintln!("    pcm-audio --play speech.pcm --sample-rate 24000 --channels 1");
    eprintln!();
    eprintln!("  Wrap raw mono PCM16 in a WAV file:");
    eprintln!("    pcm-audio --to-wav mic.pcm --sample-rate 16000 --output mic.wav");
    eprintln!();
    eprintln!("  Print the base64 PCM payload of a WAV file:");
    eprintln!("    pcm-audio --payload mic.wav");
    eprintln!();
    eprintln!("  Daemon mode (JSON-RPC server):");
    eprintln!("    pcm-audio --daemon");
    eprintln!();
    eprintln!("Run 'pcm-audio --help' for full options.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn print_usage_doesnt_panic() {
        print_usage();
    }

    #[test]
    fn to_wav_writes_readable_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("mic.pcm");
        let output = dir.path().join("nested").join("mic.wav");
        std::fs::write(&input, pcm16_to_bytes(&[1, -2, 3])).unwrap();

        let config = AudioConfig {
            capture_rate: 8000,
            ..Default::default()
        };
        run_to_wav(&input, &output, &config).unwrap();

        let wav = read_wav(&output).unwrap();
        assert_eq!(wav.sample_rate, 8000);
        assert_eq!(wav.channels, 1);
        assert_eq!(wav.samples, vec![1, -2, 3]);
    }

    #[test]
    fn to_wav_missing_input() {
        let dir = tempdir().unwrap();
        let err = run_to_wav(
            &dir.path().join("missing.pcm"),
            &dir.path().join("out.wav"),
            &AudioConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::IoFailed);
    }
}
