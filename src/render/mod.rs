pub mod canvas;
pub mod color;
pub mod frame;
pub mod spectrogram;
pub mod text;
