use super::canvas::Rgba;
use crate::config::ColorScheme;

const VIRIDIS: [[f32; 3]; 5] = [
    [68.0, 1.0, 84.0],
    [59.0, 82.0, 139.0],
    [33.0, 145.0, 140.0],
    [94.0, 201.0, 98.0],
    [253.0, 231.0, 37.0],
];

const MAGMA: [[f32; 3]; 5] = [
    [0.0, 0.0, 4.0],
    [81.0, 18.0, 124.0],
    [183.0, 55.0, 121.0],
    [252.0, 137.0, 97.0],
    [252.0, 253.0, 191.0],
];

impl ColorScheme {
    /// Bar color from the raw linear magnitude (not the dB value).
    pub fn color(&self, magnitude: f32) -> Rgba {
        match self {
            ColorScheme::YellowRed => yellow_red(magnitude),
            ColorScheme::Viridis => gradient(&VIRIDIS, magnitude),
            ColorScheme::Magma => gradient(&MAGMA, magnitude),
            ColorScheme::Grayscale => {
                let v = (20.0 + magnitude.clamp(0.0, 1.0) * 235.0) as u8;
                [v, v, v, 255]
            }
        }
    }
}

fn yellow_red(m: f32) -> Rgba {
    let r = (20.0 + m * 2.0 * 255.0).clamp(0.0, 255.0).floor();
    let g = (20.0 + m * 255.0).clamp(0.0, 255.0).floor();
    let b = (10.0 + m * 90.0).clamp(0.0, 100.0).floor();
    [r as u8, g as u8, b as u8, 255]
}

fn gradient(stops: &[[f32; 3]], m: f32) -> Rgba {
    let t = m.clamp(0.0, 1.0) * (stops.len() - 1) as f32;
    let i = (t.floor() as usize).min(stops.len() - 2);
    let f = t - i as f32;
    let mix = |c: usize| (stops[i][c] + (stops[i + 1][c] - stops[i][c]) * f).round() as u8;
    [mix(0), mix(1), mix(2), 255]
}
