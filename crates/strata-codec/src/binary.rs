//! Compact binary settings files.
//!
//! Layout: `STRC` magic, a big-endian `u32` layout version, then the
//! bincode encoding of the [`SettingsDocument`].

use crate::document::SettingsDocument;
use crate::error::{CodecError, CodecResult};
use crate::SettingsCodec;

pub const BINARY_MAGIC: &[u8; 4] = b"STRC";
const LAYOUT_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryCodec;

impl SettingsCodec for BinaryCodec {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<SettingsDocument> {
        if bytes.len() < 8 || &bytes[0..4] != BINARY_MAGIC {
            return Err(CodecError::InvalidMagic);
        }
        let mut layout = [0u8; 4];
        layout.copy_from_slice(&bytes[4..8]);
        let layout = u32::from_be_bytes(layout);
        if layout != LAYOUT_VERSION {
            return Err(CodecError::UnsupportedLayout(layout));
        }
        Ok(bincode::deserialize(&bytes[8..])?)
    }

    fn encode(&self, doc: &SettingsDocument) -> CodecResult<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(BINARY_MAGIC);
        out.extend_from_slice(&LAYOUT_VERSION.to_be_bytes());
        out.extend_from_slice(&bincode::serialize(doc)?);
        Ok(out)
    }
}
