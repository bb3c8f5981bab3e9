use clap::Parser;
use std::path::PathBuf;

use crate::config::{ColorScheme, Preset};

#[derive(Parser, Debug, Default)]
#[command(name = "sonogram", about = "Render an audio file as a spectrogram video")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG, AAC; anything else goes through ffmpeg)
    pub input: PathBuf,

    /// Output video file
    #[arg(short, long, default_value = "spectrogram.mp4")]
    pub output: PathBuf,

    /// Config file (defaults to sonogram.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// FFT window length in samples (power of two recommended) [default: 2048]
    #[arg(long)]
    pub frame_size: Option<usize>,

    /// Hop size in samples. Accepted for compatibility; frames advance by sample_rate / fps [default: 1024]
    #[arg(long)]
    pub hop_size: Option<usize>,

    /// Video width in pixels [default: 800]
    #[arg(long)]
    pub width: Option<u32>,

    /// Video height in pixels [default: 400]
    #[arg(long)]
    pub height: Option<u32>,

    /// Frames per second [default: 30]
    #[arg(long)]
    pub fps: Option<u32>,

    /// Override the sample rate reported by the decoder
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Bar color scheme [default: yellow-red]
    #[arg(long, value_enum)]
    pub color_scheme: Option<ColorScheme>,

    /// Lower decibel bound [default: -100]
    #[arg(long, allow_hyphen_values = true)]
    pub min_decibels: Option<f32>,

    /// Upper decibel bound [default: 0]
    #[arg(long, allow_hyphen_values = true)]
    pub max_decibels: Option<f32>,

    /// Hide the elapsed time label
    #[arg(long)]
    pub no_time_markers: bool,

    /// Hide the kHz axis labels
    #[arg(long)]
    pub no_frequency_markers: bool,

    /// TrueType/OpenType font used for labels
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// H.264 CRF quality (0-51, lower = better) [default: 23]
    #[arg(long)]
    pub crf: Option<u32>,

    /// x264 encoding preset [default: fast]
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// Render frames on all cores
    #[arg(long)]
    pub parallel: bool,

    /// ffmpeg executable used for transcoding and muxing [default: ffmpeg]
    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,
}
