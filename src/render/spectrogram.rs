use super::canvas::{Canvas, Rgba, BLACK};
use super::text::TextOverlay;
use crate::config::{ColorScheme, RenderConfig};
use crate::error::Result;

const MARKER_COLOR: Rgba = [128, 128, 128, 255];
const MARKER_FONT_SIZE: f32 = 10.0;
const TIME_COLOR: Rgba = [255, 255, 255, 255];
const TIME_FONT_SIZE: f32 = 12.0;

/// Floor applied before taking the log of a magnitude.
const MIN_MAGNITUDE: f32 = 1e-7;
/// Bars are normalised over the fixed window `[-60 dB, -10 dB]`.
const DB_OFFSET: f32 = 60.0;
const DB_RANGE: f32 = 50.0;

/// Render cutoff: half the spectrum length, capped at a quarter of the sample
/// rate. Fractional, so an odd-length spectrum also draws its middle bin and
/// every bar is `width / max_bin` wide.
pub fn max_bin(spectrum_len: usize, sample_rate: u32) -> f32 {
    (spectrum_len as f32 / 2.0).min((sample_rate / 4) as f32)
}

/// `Time: N.Ns`, with halfway values rounded up.
pub fn time_label(seconds: f64) -> String {
    // Only exact quarters can sit halfway between two tenths.
    let quarters = seconds * 4.0;
    let seconds = if quarters.fract() == 0.0 && quarters % 2.0 == 1.0 {
        seconds + 0.01
    } else {
        seconds
    };
    format!("Time: {:.1}s", seconds)
}

/// Bar height as a fraction of the canvas height, from the dB magnitude.
pub fn normalized_level(magnitude: f32) -> f32 {
    let db = 20.0 * magnitude.max(MIN_MAGNITUDE).log10();
    ((db + DB_OFFSET) / DB_RANGE).clamp(0.0, 1.0)
}

/// Draws one spectrum per frame: kHz axis labels, one bar per bin, and the
/// elapsed time.
pub struct SpectrogramRenderer<'a> {
    width: u32,
    height: u32,
    sample_rate: u32,
    frame_size: usize,
    color_scheme: ColorScheme,
    show_time_markers: bool,
    show_frequency_markers: bool,
    text: Option<&'a TextOverlay>,
}

impl<'a> SpectrogramRenderer<'a> {
    pub fn new(config: &RenderConfig, sample_rate: u32, text: Option<&'a TextOverlay>) -> Self {
        Self {
            width: config.width,
            height: config.height,
            sample_rate,
            frame_size: config.frame_size,
            color_scheme: config.color_scheme,
            show_time_markers: config.show_time_markers,
            show_frequency_markers: config.show_frequency_markers,
            text,
        }
    }

    pub fn canvas(&self) -> Result<Canvas> {
        Canvas::new(self.width, self.height)
    }

    pub fn render(&self, canvas: &mut Canvas, spectrum: &[f32], start_sample: usize) {
        canvas.clear(BLACK);

        let height = self.height as f32;
        let max_bin = max_bin(spectrum.len(), self.sample_rate);

        if max_bin > 0.0 {
            let freq_step = self.sample_rate as f32 / self.frame_size as f32;
            let top_freq = max_bin * freq_step;

            if self.show_frequency_markers {
                if let Some(text) = self.text {
                    let mut freq = 1000.0f32;
                    while freq < top_freq {
                        let y = height - freq / top_freq * height;
                        let label = format!("{}kHz", (freq / 1000.0).round() as u32);
                        text.draw(canvas, &label, 5.0, y, MARKER_FONT_SIZE, MARKER_COLOR);
                        freq += 1000.0;
                    }
                }
            }

            let bin_width = self.width as f32 / max_bin;
            let bins = spectrum
                .iter()
                .enumerate()
                .take_while(|&(i, _)| (i as f32) < max_bin);
            for (i, &magnitude) in bins {
                let bar_height = normalized_level(magnitude) * height;
                let color = self.color_scheme.color(magnitude);
                // +0.5 closes seams between neighbouring bars
                canvas.fill_rect(
                    i as f32 * bin_width,
                    height - bar_height,
                    bin_width + 0.5,
                    bar_height,
                    color,
                );
            }
        }

        if self.show_time_markers {
            if let Some(text) = self.text {
                let label = time_label(start_sample as f64 / self.sample_rate as f64);
                text.draw(canvas, &label, 10.0, 20.0, TIME_FONT_SIZE, TIME_COLOR);
            }
        }
    }
}
