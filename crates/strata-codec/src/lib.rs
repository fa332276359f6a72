//! Settings file codecs for Strata.
//!
//! The loader treats the on-disk format as a boundary: anything that turns
//! bytes into a [`SettingsDocument`] and back can be plugged in through
//! [`SettingsCodec`]. Two codecs ship with the crate:
//!
//! - [`TextCodec`]: sectioned JSON, for files people edit
//! - [`BinaryCodec`]: bincode behind a magic header, for exported builds

pub mod binary;
pub mod document;
pub mod error;
pub mod text;

pub use binary::{BinaryCodec, BINARY_MAGIC};
pub use document::SettingsDocument;
pub use error::{CodecError, CodecResult};
pub use text::{TextCodec, VERSION_KEY};

/// Conversion between settings file bytes and a [`SettingsDocument`].
pub trait SettingsCodec: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn decode(&self, bytes: &[u8]) -> CodecResult<SettingsDocument>;

    fn encode(&self, doc: &SettingsDocument) -> CodecResult<Vec<u8>>;
}

/// Extension of binary settings files.
pub const BINARY_EXTENSION: &str = "binary";

/// Pick a codec from a file name: `.binary` files are binary, everything
/// else is text.
pub fn codec_for_path(path: &str) -> &'static dyn SettingsCodec {
    let is_binary = std::path::Path::new(path)
        .extension()
        .is_some_and(|ext| ext == BINARY_EXTENSION);
    if is_binary {
        &BinaryCodec
    } else {
        &TextCodec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_chosen_by_extension() {
        assert_eq!(codec_for_path("project://project.binary").name(), "binary");
        assert_eq!(codec_for_path("/tmp/out.settings").name(), "text");
        assert_eq!(codec_for_path("override.cfg").name(), "text");
        assert_eq!(codec_for_path("binary").name(), "text");
    }
}
