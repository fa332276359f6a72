use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("invalid archive magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported archive version: {0}")]
    UnsupportedVersion(u32),

    #[error("archive checksum mismatch")]
    ChecksumMismatch,

    #[error("file not found in archive: {0}")]
    FileNotFound(String),

    #[error("corrupt archive at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    #[error("CRC32 mismatch for {path}")]
    CrcMismatch { path: String },

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("no archive embedded in {0}")]
    NoEmbeddedArchive(String),

    #[error("invalid archive path: {0:?}")]
    InvalidPath(String),

    #[error("archive mounting is disabled")]
    Disabled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PackResult<T> = Result<T, PackError>;
