use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use crate::error::{PipelineError, Result};

/// Turns a windowed buffer into a magnitude spectrum where bin `i` sits at
/// `i * sample_rate / frame_size` Hz.
pub trait SpectrumAnalyzer: Send + Sync {
    fn magnitudes(&self, windowed: &[f32]) -> Result<Vec<f32>>;
}

/// Forward FFT planned once per run. Returns `frame_size / 2 + 1` unnormalised
/// magnitudes `|X[k]|`.
pub struct FftAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    frame_size: usize,
}

impl FftAnalyzer {
    pub fn new(frame_size: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(frame_size);
        Self { fft, frame_size }
    }
}

impl SpectrumAnalyzer for FftAnalyzer {
    fn magnitudes(&self, windowed: &[f32]) -> Result<Vec<f32>> {
        if windowed.len() != self.frame_size {
            return Err(PipelineError::Analysis(format!(
                "expected {} samples, got {}",
                self.frame_size,
                windowed.len()
            )));
        }

        let mut buffer: Vec<Complex<f32>> =
            windowed.iter().map(|&s| Complex::new(s, 0.0)).collect();
        self.fft.process(&mut buffer);

        Ok(buffer[..=self.frame_size / 2].iter().map(|c| c.norm()).collect())
    }
}
