use std::path::PathBuf;

/// Errors surfaced by the spectrogram pipeline, one variant per stage.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot read input {path}: {message}")]
    Input { path: PathBuf, message: String },

    #[error("transcode failed: {0}")]
    Transcode(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("spectral analysis failed: {0}")]
    Analysis(String),

    #[error("render failed: {message}")]
    Render {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("run cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn input(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        PipelineError::Input {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        PipelineError::Render {
            message: message.into(),
            source: None,
        }
    }

    pub fn render_io(message: impl Into<String>, source: std::io::Error) -> Self {
        PipelineError::Render {
            message: message.into(),
            source: Some(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
