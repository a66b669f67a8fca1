//! Command-line interface.
//!
//! Standalone conversion and playback modes, plus the JSON-RPC daemon mode.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::AudioConfig;

/// pcm-audio: PCM/WAV/base64 conversion and playback
#[derive(Parser, Debug)]
#[command(name = "pcm-audio")]
#[command(about = "PCM/WAV/base64 audio conversion and playback")]
#[command(version)]
pub struct Cli {
    /// Play a WAV file, or raw little-endian PCM16 (see --sample-rate/--channels)
    #[arg(long, value_name = "FILE")]
    pub play: Option<PathBuf>,

    /// Wrap a raw mono PCM16 file in a WAV container
    #[arg(long, value_name = "FILE")]
    pub to_wav: Option<PathBuf>,

    /// Print the base64 PCM payload (JSON) for a WAV file
    #[arg(long, value_name = "FILE")]
    pub payload: Option<PathBuf>,

    /// Output WAV file path (for --to-wav)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Sample rate of raw PCM input in Hz
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=384_000))]
    pub sample_rate: Option<u32>,

    /// Channel count of raw PCM input
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..=8))]
    pub channels: Option<u16>,

    /// Run in daemon mode (JSON-RPC over stdio)
    #[arg(long)]
    pub daemon: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Returns true if running in daemon mode.
    pub fn is_daemon_mode(&self) -> bool {
        self.daemon
    }

    /// Returns true if running a standalone command.
    pub fn is_cli_mode(&self) -> bool {
        !self.daemon && (self.play.is_some() || self.to_wav.is_some() || self.payload.is_some())
    }

    /// Applies command-line overrides to the loaded configuration.
    ///
    /// `--sample-rate` overrides both the playback and capture rates since
    /// each command only uses one of them.
    pub fn apply_to(&self, config: &mut AudioConfig) {
        if let Some(rate) = self.sample_rate {
            config.playback_rate = rate;
            config.capture_rate = rate;
        }
        if let Some(channels) = self.channels {
            config.playback_channels = channels;
        }
    }

    /// Returns the effective WAV output path for `input`.
    ///
    /// Defaults to `<output_dir>/<input stem>.wav` if not specified.
    pub fn output_path(&self, input: &Path, config: &AudioConfig) -> PathBuf {
        if let Some(ref path) = self.output {
            return path.clone();
        }
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        config.effective_output_dir().join(format!("{}.wav", stem))
    }
}

/// Returns true if `path` looks like a WAV file by extension.
pub fn is_wav_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}
