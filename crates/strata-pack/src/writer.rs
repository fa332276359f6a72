use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::entry::{
    entry_key, ARCHIVE_MAGIC, EMBED_FOOTER_LEN, EMBED_MAGIC, FORMAT_VERSION, HEADER_LEN, TRAILER_LEN,
};
use crate::error::{PackError, PackResult};

/// Result of writing an archive file.
#[derive(Clone, Debug)]
pub struct ArchiveFile {
    pub path: PathBuf,
    pub file_count: usize,
    pub byte_len: u64,
    pub checksum: [u8; 32],
}

/// Builds a resource archive from a set of files.
///
/// Files are written in key order, so the same inputs always produce the
/// same bytes.
#[derive(Debug)]
pub struct ArchiveWriter {
    files: BTreeMap<String, Vec<u8>>,
    level: i32,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self {
            files: BTreeMap::new(),
            level: 3,
        }
    }

    /// Set the zstd compression level.
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Queue a file. A later file with the same key replaces the earlier one.
    pub fn add_file(&mut self, path: &str, data: &[u8]) -> PackResult<()> {
        let key = entry_key(path)?;
        self.files.insert(key, data.to_vec());
        Ok(())
    }

    /// Queue every regular file under `root`, keyed by its path relative to
    /// `root`. Returns the number of files added.
    pub fn add_directory(&mut self, root: &Path) -> PackResult<usize> {
        let mut added = 0;
        for entry in walkdir::WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|e| PackError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let rel = relative.to_string_lossy().replace('\\', "/");
            let data = std::fs::read(entry.path())?;
            self.add_file(&rel, &data)?;
            tracing::debug!(path = %rel, bytes = data.len(), "queued archive file");
            added += 1;
        }
        Ok(added)
    }

    /// Number of files queued.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write the archive to `path`.
    pub fn finish(self, path: &Path) -> PackResult<ArchiveFile> {
        let file_count = self.files.len();
        let bytes = self.finish_to_bytes()?;
        std::fs::write(path, &bytes)?;
        Ok(ArchiveFile {
            path: path.to_path_buf(),
            file_count,
            byte_len: bytes.len() as u64,
            checksum: trailer_checksum(&bytes),
        })
    }

    /// Build the archive in memory (no disk I/O).
    pub fn finish_to_bytes(self) -> PackResult<Vec<u8>> {
        let mut data = Vec::new();

        // Header: magic + version + total length + directory offset.
        // Both lengths are patched once known.
        data.extend_from_slice(ARCHIVE_MAGIC);
        data.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        data.extend_from_slice(&0u64.to_be_bytes());
        data.extend_from_slice(&0u64.to_be_bytes());
        debug_assert_eq!(data.len(), HEADER_LEN);

        let mut directory = Vec::with_capacity(self.files.len());
        for (path, contents) in &self.files {
            let compressed = zstd::encode_all(contents.as_slice(), self.level)
                .map_err(|e| PackError::CompressionFailed(e.to_string()))?;
            let offset = data.len() as u64;
            let crc = crc32fast::hash(&compressed);
            data.extend_from_slice(&compressed);
            directory.push((path, offset, contents.len() as u64, compressed.len() as u64, crc));
        }

        let dir_offset = data.len() as u64;
        data.extend_from_slice(&(directory.len() as u32).to_be_bytes());
        for (path, offset, size, compressed_size, crc) in directory {
            encode_varint(&mut data, path.len() as u64);
            data.extend_from_slice(path.as_bytes());
            data.extend_from_slice(&offset.to_be_bytes());
            encode_varint(&mut data, size);
            encode_varint(&mut data, compressed_size);
            data.extend_from_slice(&crc.to_be_bytes());
        }

        let total_len = (data.len() + TRAILER_LEN) as u64;
        data[8..16].copy_from_slice(&total_len.to_be_bytes());
        data[16..24].copy_from_slice(&dir_offset.to_be_bytes());

        // Trailer: BLAKE3 checksum of everything so far
        let checksum = *blake3::hash(&data).as_bytes();
        data.extend_from_slice(&checksum);
        Ok(data)
    }
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Append `archive` to `executable`, followed by the archive length and
/// [`EMBED_MAGIC`], so the result can be opened with
/// [`ArchiveReader::open_embedded`](crate::ArchiveReader::open_embedded).
pub fn embed_bytes(executable: &[u8], archive: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(executable.len() + archive.len() + EMBED_FOOTER_LEN);
    out.extend_from_slice(executable);
    out.extend_from_slice(archive);
    out.extend_from_slice(&(archive.len() as u64).to_be_bytes());
    out.extend_from_slice(EMBED_MAGIC);
    out
}

/// File-level [`embed_bytes`]: writes `executable` + `archive` to `output`.
pub fn embed(executable: &Path, archive: &Path, output: &Path) -> PackResult<u64> {
    let exe = std::fs::read(executable)?;
    let pack = std::fs::read(archive)?;
    let combined = embed_bytes(&exe, &pack);
    std::fs::write(output, &combined)?;
    tracing::debug!(output = %output.display(), offset = exe.len(), "embedded archive");
    Ok(exe.len() as u64)
}

fn trailer_checksum(archive: &[u8]) -> [u8; 32] {
    let mut checksum = [0u8; 32];
    if archive.len() >= TRAILER_LEN {
        checksum.copy_from_slice(&archive[archive.len() - TRAILER_LEN..]);
    }
    checksum
}

/// Encode a u64 as a variable-length integer.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a variable-length integer. Returns (value, bytes_consumed).
pub(crate) fn decode_varint(data: &[u8], offset: u64) -> PackResult<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0;
    for (i, &byte) in data.iter().enumerate() {
        value |= ((byte & 0x7F) as u64) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        if shift >= 64 {
            return Err(PackError::Corrupt {
                offset,
                reason: "varint overflow".into(),
            });
        }
    }
    Err(PackError::Corrupt {
        offset,
        reason: "truncated varint".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_boundaries() {
        for value in [0, 127, 128, 1_000_000, u64::MAX] {
            let mut buf = Vec::new();
            encode_varint(&mut buf, value);
            assert_eq!(decode_varint(&buf, 0).unwrap(), (value, buf.len()));
        }
    }

    #[test]
    fn decode_varint_truncated() {
        let err = decode_varint(&[0x80], 7).unwrap_err();
        assert!(matches!(err, PackError::Corrupt { offset: 7, .. }));
    }

    #[test]
    fn output_is_deterministic() {
        let build = |order: &[&str]| {
            let mut writer = ArchiveWriter::new();
            for name in order {
                writer.add_file(name, name.as_bytes()).unwrap();
            }
            writer.finish_to_bytes().unwrap()
        };
        assert_eq!(build(&["a.txt", "b.txt"]), build(&["b.txt", "a.txt"]));
    }

    #[test]
    fn header_records_total_length() {
        let mut writer = ArchiveWriter::new();
        writer.add_file("project.settings", b"{}").unwrap();
        let bytes = writer.finish_to_bytes().unwrap();
        assert_eq!(&bytes[0..4], ARCHIVE_MAGIC);
        let total = u64::from_be_bytes(bytes[8..16].try_into().unwrap());
        assert_eq!(total, bytes.len() as u64);
    }

    #[test]
    fn duplicate_keys_replace() {
        let mut writer = ArchiveWriter::new();
        writer.add_file("a.txt", b"one").unwrap();
        writer.add_file("project://a.txt", b"two").unwrap();
        assert_eq!(writer.len(), 1);
    }

    #[test]
    fn add_directory_walks_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("levels")).unwrap();
        std::fs::write(dir.path().join("project.settings"), b"{}").unwrap();
        std::fs::write(dir.path().join("levels/one.lvl"), b"1").unwrap();

        let mut writer = ArchiveWriter::new();
        assert_eq!(writer.add_directory(dir.path()).unwrap(), 2);
        assert_eq!(writer.len(), 2);
    }

    #[test]
    fn embed_appends_footer() {
        let combined = embed_bytes(b"EXE", b"PACK");
        assert_eq!(&combined[..7], b"EXEPACK");
        assert_eq!(&combined[combined.len() - 4..], EMBED_MAGIC);
        let len_bytes: [u8; 8] = combined[7..15].try_into().unwrap();
        assert_eq!(u64::from_be_bytes(len_bytes), 4);
    }
}
