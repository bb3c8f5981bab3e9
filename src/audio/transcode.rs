use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{PipelineError, Result};

/// Converts a container the native decoder cannot read into a PCM WAV file.
pub trait Transcoder: Send + Sync {
    fn to_wav(&self, input: &Path, output: &Path) -> Result<()>;
}

pub struct FfmpegTranscoder {
    ffmpeg: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self { ffmpeg: ffmpeg.into() }
    }
}

impl Transcoder for FfmpegTranscoder {
    fn to_wav(&self, input: &Path, output: &Path) -> Result<()> {
        log::info!("Transcoding {} to WAV with ffmpeg", input.display());

        let result = Command::new(&self.ffmpeg)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-f", "wav"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                PipelineError::Transcode(format!(
                    "failed to spawn {}: {}. Is ffmpeg installed?",
                    self.ffmpeg.display(),
                    e
                ))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(PipelineError::Transcode(format!(
                "ffmpeg exited with {}:\n{}",
                result.status,
                stderr.trim_end()
            )));
        }
        Ok(())
    }
}
