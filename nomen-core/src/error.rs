use thiserror::Error;

/// All errors produced by nomen-core.
#[derive(Debug, Error)]
pub enum NomenError {
    #[error("audio decode error: {0}")]
    Decode(String),

    #[error("audio too short: got {got} samples, need at least {need}")]
    InsufficientAudio { got: usize, need: usize },

    #[error("embedding extraction error: {0}")]
    Extraction(String),

    #[error("ONNX session error: {0}")]
    OnnxSession(String),

    #[error("model file not found: {path}")]
    ModelNotFound { path: std::path::PathBuf },

    #[error("voice store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NomenError {
    /// `true` for faults caused by the caller's input: undecodable or
    /// too-short audio. Hosts map these to a 4xx-equivalent response;
    /// everything else is a server fault.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::InsufficientAudio { .. })
    }
}

pub type Result<T> = std::result::Result<T, NomenError>;
