use crate::error::{PipelineError, Result};

/// RGBA8 raster surface, row-major, top-left origin.
#[derive(Clone, Debug)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pixels: Vec<u8>,
}

pub type Rgba = [u8; 4];

pub const BLACK: Rgba = [0, 0, 0, 255];

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| PipelineError::render(format!("canvas {}x{} is too large", width, height)))?;
        let mut canvas = Self {
            width,
            height,
            pixels: vec![0; len],
        };
        canvas.clear(BLACK);
        Ok(canvas)
    }

    pub fn clear(&mut self, color: Rgba) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    /// Fill every pixel whose centre lies inside `[x, x+w) x [y, y+h)`.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let (x0, x1) = Self::span(x, w, self.width);
        let (y0, y1) = Self::span(y, h, self.height);
        for py in y0..y1 {
            let row = (py * self.width) as usize * 4;
            for px in x0..x1 {
                let idx = row + px as usize * 4;
                self.pixels[idx..idx + 4].copy_from_slice(&color);
            }
        }
    }

    fn span(start: f32, len: f32, limit: u32) -> (u32, u32) {
        let lo = (start - 0.5).ceil().max(0.0);
        let hi = (start + len - 0.5).ceil().clamp(0.0, limit as f32);
        (lo.min(hi) as u32, hi as u32)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let idx = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }
}
