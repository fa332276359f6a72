use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open resource archive {path}: {source}")]
    CannotOpen {
        path: PathBuf,
        #[source]
        source: strata_pack::PackError,
    },

    #[error("settings file not found: {0}")]
    NotFound(String),

    #[error("cannot parse settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: strata_codec::CodecError,
    },

    #[error("settings file {path} has format version {found}, newer than supported {supported}")]
    NewerFormat {
        path: String,
        found: u32,
        supported: u32,
    },

    #[error("invalid loader configuration: {0}")]
    Config(String),

    #[error("archive error: {0}")]
    Pack(#[from] strata_pack::PackError),

    #[error("encode error: {0}")]
    Codec(#[from] strata_codec::CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LoadResult<T> = Result<T, LoadError>;
