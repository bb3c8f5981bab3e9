use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::error::{PipelineError, Result};

/// Bar color mapping. Only the raw linear magnitude drives color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ColorScheme {
    #[default]
    #[serde(alias = "yellowRed")]
    YellowRed,
    Viridis,
    Magma,
    Grayscale,
}

/// x264 speed/compression trade-off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Ultrafast,
    Superfast,
    Veryfast,
    Faster,
    #[default]
    Fast,
    Medium,
    Slow,
    Slower,
    Veryslow,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Ultrafast => "ultrafast",
            Preset::Superfast => "superfast",
            Preset::Veryfast => "veryfast",
            Preset::Faster => "faster",
            Preset::Fast => "fast",
            Preset::Medium => "medium",
            Preset::Slow => "slow",
            Preset::Slower => "slower",
            Preset::Veryslow => "veryslow",
        }
    }
}

/// On-disk configuration (`sonogram.toml`). Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub analysis: AnalysisSection,
    #[serde(default)]
    pub render: RenderSection,
    #[serde(default)]
    pub tools: ToolsSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputSection {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    pub crf: Option<u32>,
    pub preset: Option<Preset>,
    pub font: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisSection {
    pub frame_size: Option<usize>,
    pub hop_size: Option<usize>,
    pub sample_rate: Option<u32>,
    pub min_decibels: Option<f32>,
    pub max_decibels: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RenderSection {
    pub color_scheme: Option<ColorScheme>,
    pub show_time_markers: Option<bool>,
    pub show_frequency_markers: Option<bool>,
    pub parallel: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ToolsSection {
    pub ffmpeg: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PipelineError::input(path, e))?;
    toml::from_str(&content)
        .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))
}

/// Looks for `sonogram.toml` in the working directory, then the user config dirs.
pub fn discover_config_path() -> Option<PathBuf> {
    let local = PathBuf::from("sonogram.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("sonogram").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("sonogram").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

/// Loads the explicit config file if given (errors propagate), otherwise the
/// first discovered one (errors are logged and ignored).
pub fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig> {
    if let Some(path) = explicit {
        let cfg = load_config(path)?;
        log::info!("Loaded config from {}", path.display());
        return Ok(cfg);
    }
    match discover_config_path() {
        Some(path) => match load_config(&path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                Ok(cfg)
            }
            Err(err) => {
                log::warn!("Ignoring config {}: {}", path.display(), err);
                Ok(FileConfig::default())
            }
        },
        None => Ok(FileConfig::default()),
    }
}

pub const DEFAULT_FRAME_SIZE: usize = 2048;
pub const DEFAULT_HOP_SIZE: usize = 1024;
pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 400;
pub const DEFAULT_FPS: u32 = 30;
pub const DEFAULT_MIN_DECIBELS: f32 = -100.0;
pub const DEFAULT_MAX_DECIBELS: f32 = 0.0;
pub const DEFAULT_CRF: u32 = 23;
/// Largest accepted width or height (H.264 level 6.2 tops out at 8192).
pub const MAX_DIMENSION: u32 = 8192;

/// Immutable parameters for one pipeline run.
///
/// `hop_size`, `min_decibels` and `max_decibels` are carried but do not
/// influence frame stepping or bar heights. Any `hop_size` is accepted.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    pub frame_size: usize,
    pub hop_size: usize,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Overrides the decoded sample rate when set.
    pub sample_rate: Option<u32>,
    pub color_scheme: ColorScheme,
    pub min_decibels: f32,
    pub max_decibels: f32,
    pub show_time_markers: bool,
    pub show_frequency_markers: bool,
    pub font: Option<PathBuf>,
    pub crf: u32,
    pub preset: Preset,
    pub parallel: bool,
    pub ffmpeg: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_size: DEFAULT_FRAME_SIZE,
            hop_size: DEFAULT_HOP_SIZE,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
            sample_rate: None,
            color_scheme: ColorScheme::default(),
            min_decibels: DEFAULT_MIN_DECIBELS,
            max_decibels: DEFAULT_MAX_DECIBELS,
            show_time_markers: true,
            show_frequency_markers: true,
            font: None,
            crf: DEFAULT_CRF,
            preset: Preset::default(),
            parallel: false,
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

impl RenderConfig {
    /// Merge command line over file over built-in defaults.
    pub fn resolve(cli: &Cli, file: &FileConfig) -> Self {
        let d = RenderConfig::default();
        Self {
            frame_size: cli.frame_size.or(file.analysis.frame_size).unwrap_or(d.frame_size),
            hop_size: cli.hop_size.or(file.analysis.hop_size).unwrap_or(d.hop_size),
            width: cli.width.or(file.output.width).unwrap_or(d.width),
            height: cli.height.or(file.output.height).unwrap_or(d.height),
            fps: cli.fps.or(file.output.fps).unwrap_or(d.fps),
            sample_rate: cli.sample_rate.or(file.analysis.sample_rate),
            color_scheme: cli
                .color_scheme
                .or(file.render.color_scheme)
                .unwrap_or(d.color_scheme),
            min_decibels: cli
                .min_decibels
                .or(file.analysis.min_decibels)
                .unwrap_or(d.min_decibels),
            max_decibels: cli
                .max_decibels
                .or(file.analysis.max_decibels)
                .unwrap_or(d.max_decibels),
            show_time_markers: !cli.no_time_markers
                && file.render.show_time_markers.unwrap_or(d.show_time_markers),
            show_frequency_markers: !cli.no_frequency_markers
                && file
                    .render
                    .show_frequency_markers
                    .unwrap_or(d.show_frequency_markers),
            font: cli.font.clone().or_else(|| file.output.font.clone()),
            crf: cli.crf.or(file.output.crf).unwrap_or(d.crf),
            preset: cli.preset.or(file.output.preset).unwrap_or(d.preset),
            parallel: cli.parallel || file.render.parallel.unwrap_or(d.parallel),
            ffmpeg: cli
                .ffmpeg
                .clone()
                .or_else(|| file.tools.ffmpeg.clone())
                .unwrap_or(d.ffmpeg),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_size < 2 {
            return Err(PipelineError::Config(format!(
                "frame_size must be at least 2, got {}",
                self.frame_size
            )));
        }
        if !self.frame_size.is_power_of_two() {
            log::warn!("frame_size {} is not a power of two", self.frame_size);
        }
        if self.width == 0 || self.height == 0 {
            return Err(PipelineError::Config(format!(
                "resolution must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(PipelineError::Config(format!(
                "resolution {}x{} exceeds {} pixels per side",
                self.width, self.height, MAX_DIMENSION
            )));
        }
        if self.fps == 0 {
            return Err(PipelineError::Config("fps must be positive".into()));
        }
        if self.sample_rate == Some(0) {
            return Err(PipelineError::Config("sample_rate override must be positive".into()));
        }
        if self.crf > 51 {
            return Err(PipelineError::Config(format!("crf must be 0-51, got {}", self.crf)));
        }
        if !(self.min_decibels < self.max_decibels) {
            return Err(PipelineError::Config(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}
