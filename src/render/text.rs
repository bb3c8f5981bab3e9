use fontdue::{Font, FontSettings};
use std::path::{Path, PathBuf};

use super::canvas::{Canvas, Rgba};
use crate::error::{PipelineError, Result};

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub struct TextOverlay {
    font: Font,
}

impl TextOverlay {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| PipelineError::Config(format!("invalid font data: {}", e)))?;
        Ok(Self { font })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| PipelineError::input(path, e))?;
        Self::from_bytes(&bytes)
    }

    /// Load the requested font, or the first system font found. An explicit
    /// font that fails to load is an error; finding no system font is not.
    pub fn load(explicit: Option<&Path>) -> Result<Option<Self>> {
        if let Some(path) = explicit {
            log::info!("Using font {}", path.display());
            return Self::from_path(path).map(Some);
        }
        for candidate in SYSTEM_FONTS.iter().map(PathBuf::from) {
            if !candidate.is_file() {
                continue;
            }
            match Self::from_path(&candidate) {
                Ok(overlay) => {
                    log::debug!("Using system font {}", candidate.display());
                    return Ok(Some(overlay));
                }
                Err(err) => log::debug!("Skipping font {}: {}", candidate.display(), err),
            }
        }
        log::warn!("No usable font found; labels will not be drawn (pass --font to fix)");
        Ok(None)
    }

    /// Composite `text` with its baseline at `baseline_y`, starting at `x`.
    pub fn draw(&self, canvas: &mut Canvas, text: &str, x: f32, baseline_y: f32, size: f32, color: Rgba) {
        let width = canvas.width as i32;
        let height = canvas.height as i32;
        let pixels = canvas.pixels_mut();

        let mut cursor_x = x;
        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, size);
            let glyph_x = cursor_x.round() as i32 + metrics.xmin;
            let glyph_y = baseline_y.round() as i32 - metrics.height as i32 - metrics.ymin;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let alpha = bitmap[gy * metrics.width + gx];
                    if alpha == 0 {
                        continue;
                    }

                    let px = glyph_x + gx as i32;
                    let py = glyph_y + gy as i32;
                    if px < 0 || py < 0 || px >= width || py >= height {
                        continue;
                    }

                    let idx = ((py * width + px) * 4) as usize;
                    let a = alpha as f32 / 255.0 * (color[3] as f32 / 255.0);
                    let inv_a = 1.0 - a;
                    for c in 0..3 {
                        pixels[idx + c] = (color[c] as f32 * a + pixels[idx + c] as f32 * inv_a) as u8;
                    }
                    pixels[idx + 3] = 255;
                }
            }

            cursor_x += metrics.advance_width;
        }
    }
}
