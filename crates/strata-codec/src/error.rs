use thiserror::Error;

/// Failure to decode or encode a settings document.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary encoding error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("invalid settings magic")]
    InvalidMagic,

    #[error("unsupported binary settings layout: {0}")]
    UnsupportedLayout(u32),

    #[error("malformed settings document: {0}")]
    Malformed(String),
}

pub type CodecResult<T> = Result<T, CodecError>;
