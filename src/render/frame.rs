use std::path::PathBuf;

use super::canvas::Canvas;
use crate::error::{PipelineError, Result};

/// ffmpeg image2 pattern matching [`frame_file_name`].
pub const FRAME_PATTERN: &str = "frame-%06d.png";

pub fn frame_file_name(index: usize) -> String {
    format!("frame-{:06}.png", index)
}

/// Persists rendered frames. Indices handed to one sink must be contiguous
/// from zero, though they may arrive out of order.
pub trait FrameSink: Send + Sync {
    fn write_frame(&self, index: usize, canvas: &Canvas) -> Result<()>;
}

pub struct PngFrameWriter {
    dir: PathBuf,
}

impl PngFrameWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FrameSink for PngFrameWriter {
    fn write_frame(&self, index: usize, canvas: &Canvas) -> Result<()> {
        let path = self.dir.join(frame_file_name(index));
        image::save_buffer(
            &path,
            canvas.pixels(),
            canvas.width,
            canvas.height,
            image::ColorType::Rgba8,
        )
        .map_err(|e| match e {
            image::ImageError::IoError(io) => {
                PipelineError::render_io(format!("write {}", path.display()), io)
            }
            other => PipelineError::render(format!("encode {}: {}", path.display(), other)),
        })
    }
}
