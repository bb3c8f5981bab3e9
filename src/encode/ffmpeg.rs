use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::{Preset, RenderConfig};
use crate::error::{PipelineError, Result};
use crate::render::frame::FRAME_PATTERN;

/// Everything needed to mux one frame sequence with its soundtrack.
#[derive(Clone, Debug)]
pub struct AssemblyJob<'a> {
    /// Directory holding `frame-000000.png` .. `frame-{n-1}.png`.
    pub frames_dir: &'a Path,
    pub frame_count: usize,
    pub fps: u32,
    /// The original audio file, before any transcoding.
    pub audio: &'a Path,
    pub output: &'a Path,
}

pub trait VideoAssembler: Send + Sync {
    fn assemble(&self, job: &AssemblyJob<'_>) -> Result<()>;
}

pub struct FfmpegAssembler {
    ffmpeg: PathBuf,
    crf: u32,
    preset: Preset,
}

impl FfmpegAssembler {
    pub fn new(ffmpeg: impl Into<PathBuf>, crf: u32, preset: Preset) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            crf,
            preset,
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.ffmpeg.clone(), config.crf, config.preset)
    }

    fn args(&self, job: &AssemblyJob<'_>) -> Vec<OsString> {
        let fps = job.fps.to_string();
        let crf = self.crf.to_string();

        let mut args: Vec<OsString> = vec![
            "-y".into(),
            "-framerate".into(),
            (&fps).into(),
            "-i".into(),
            job.frames_dir.join(FRAME_PATTERN).into(),
            "-i".into(),
            job.audio.into(),
        ];
        args.extend(
            [
                "-c:v", "libx264",
                "-pix_fmt", "yuv420p",
                "-preset", self.preset.as_str(),
                "-crf", &crf,
                "-r", &fps,
                "-c:a", "aac",
                "-b:a", "192k",
            ]
            .into_iter()
            .map(OsString::from),
        );
        args.push(job.output.into());
        args
    }
}

impl VideoAssembler for FfmpegAssembler {
    fn assemble(&self, job: &AssemblyJob<'_>) -> Result<()> {
        if job.frame_count == 0 {
            return Err(PipelineError::Encode("no frames to encode".into()));
        }

        log::info!(
            "FFmpeg encoding {} frames @ {}fps, preset={}, crf={}",
            job.frame_count,
            job.fps,
            self.preset.as_str(),
            self.crf
        );

        let output = Command::new(&self.ffmpeg)
            .args(self.args(job))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                PipelineError::Encode(format!(
                    "failed to spawn {}: {}. Is ffmpeg installed?",
                    self.ffmpeg.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Encode(format!(
                "ffmpeg exited with {}:\n{}",
                output.status,
                stderr.trim_end()
            )));
        }

        log::info!("FFmpeg encoding complete");
        Ok(())
    }
}
