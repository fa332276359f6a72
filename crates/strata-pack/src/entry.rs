use strata_path::{simplify_path, PROJECT_PREFIX};

use crate::error::{PackError, PackResult};

/// Archive header magic.
pub const ARCHIVE_MAGIC: &[u8; 4] = b"STRP";
/// Trailer magic of an archive appended to an executable.
pub const EMBED_MAGIC: &[u8; 4] = b"STRE";
pub const FORMAT_VERSION: u32 = 1;

/// Magic, version, total length, directory offset.
pub(crate) const HEADER_LEN: usize = 4 + 4 + 8 + 8;
/// BLAKE3 checksum of everything before it.
pub(crate) const TRAILER_LEN: usize = 32;
/// Archive length followed by [`EMBED_MAGIC`].
pub(crate) const EMBED_FOOTER_LEN: usize = 8 + 4;

/// Directory record of one file stored in an archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Archive-relative path, simplified, without a scheme prefix.
    pub path: String,
    /// Offset of the compressed payload from the start of the archive.
    pub offset: u64,
    /// Uncompressed size.
    pub size: u64,
    pub compressed_size: u64,
    /// CRC32 of the compressed payload.
    pub crc32: u32,
}

/// Normalize a path for use as an archive key.
///
/// `project://a/./b.txt`, `a//b.txt` and `/a/b.txt` all key as `a/b.txt`.
/// Paths that are empty or escape the archive root are rejected.
pub fn entry_key(path: &str) -> PackResult<String> {
    let stripped = path.strip_prefix(PROJECT_PREFIX).unwrap_or(path);
    let simplified = simplify_path(stripped);
    let key = simplified.trim_start_matches('/');
    if key.is_empty() || key == ".." || key.starts_with("../") {
        return Err(PackError::InvalidPath(path.to_string()));
    }
    Ok(key.to_string())
}
