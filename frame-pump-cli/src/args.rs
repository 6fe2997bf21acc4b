//! Command-line flags. Anything given here overrides the settings file.

use std::path::PathBuf;

use clap::Parser;
use frame_pump::{Container, EncodeSettings};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Encodes raw planar video through a pluggable encoder.")]
pub struct Args {
    /// Raw I420 input, frames back to back.
    #[arg(required_unless_present = "list_codecs")]
    pub input: Option<PathBuf>,

    /// Output file (IVF unless `--container raw`).
    #[arg(required_unless_present = "list_codecs")]
    pub output: Option<PathBuf>,

    /// JSON settings file applied before the flags below.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Encoder to use (see `--list-codecs`).
    #[arg(long)]
    pub codec: Option<String>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    /// Force a keyframe every N frames. 0 leaves placement to the encoder.
    #[arg(short, long)]
    pub keyframe_interval: Option<u32>,

    #[arg(long, overrides_with = "no_error_resilient")]
    pub error_resilient: bool,

    /// Turn error resilience off even if the settings file enables it.
    #[arg(long, overrides_with = "error_resilient")]
    pub no_error_resilient: bool,

    /// Stop after N frames. 0 or negative encodes the whole input.
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    #[arg(long)]
    pub fps: Option<u32>,

    /// Target bitrate in kbit/s.
    #[arg(long)]
    pub bitrate: Option<u32>,

    /// Sample container size: 8 or 16.
    #[arg(long)]
    pub bit_depth: Option<u32>,

    /// Frames the raw codec holds back before emitting output.
    #[arg(long)]
    pub lag_in_frames: Option<u32>,

    #[arg(long)]
    pub container: Option<Container>,

    /// Print the available codecs and exit.
    #[arg(long)]
    pub list_codecs: bool,

    /// More logging. Repeat for trace output.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Don't print the per-frame progress line.
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn apply(&self, settings: &mut EncodeSettings) {
        if let Some(codec) = &self.codec {
            settings.codec = codec.clone();
        }
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(interval) = self.keyframe_interval {
            settings.keyframe_interval = interval;
        }
        if self.error_resilient {
            settings.error_resilient = true;
        } else if self.no_error_resilient {
            settings.error_resilient = false;
        }
        if let Some(limit) = self.limit {
            settings.max_frames = limit;
        }
        if let Some(fps) = self.fps {
            settings.fps = fps;
        }
        if let Some(bitrate) = self.bitrate {
            settings.bitrate_kbps = bitrate;
        }
        if let Some(bit_depth) = self.bit_depth {
            settings.bit_depth = bit_depth;
        }
        if let Some(lag) = self.lag_in_frames {
            settings.lag_in_frames = lag;
        }
        if let Some(container) = self.container {
            settings.container = container;
        }
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
