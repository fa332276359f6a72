use std::collections::HashMap;
use std::path::Path;

use crate::entry::{
    entry_key, ArchiveEntry, ARCHIVE_MAGIC, EMBED_FOOTER_LEN, EMBED_MAGIC, FORMAT_VERSION,
    HEADER_LEN, TRAILER_LEN,
};
use crate::error::{PackError, PackResult};
use crate::writer::decode_varint;

/// Random-access reader over one archive held in memory.
#[derive(Debug)]
pub struct ArchiveReader {
    data: Vec<u8>,
    /// Byte offset of the archive inside the file it was read from.
    base_offset: u64,
    entries: Vec<ArchiveEntry>,
    by_path: HashMap<String, usize>,
}

impl ArchiveReader {
    /// Parse an archive from raw bytes. `data` must hold exactly one archive.
    pub fn from_bytes(data: Vec<u8>) -> PackResult<Self> {
        Self::parse(data, 0)
    }

    /// Open an archive file.
    pub fn open(path: &Path) -> PackResult<Self> {
        Self::open_at(path, 0)
    }

    /// Open an archive that starts `offset` bytes into `path`. Bytes after
    /// the archive's recorded length are ignored.
    pub fn open_at(path: &Path, offset: u64) -> PackResult<Self> {
        let file = std::fs::read(path)?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        if start > file.len() || file.len() - start < HEADER_LEN {
            return Err(PackError::Corrupt {
                offset,
                reason: "archive shorter than its header".into(),
            });
        }
        let total = read_u64(&file[start + 8..start + 16]);
        let end = usize::try_from(total)
            .ok()
            .and_then(|len| start.checked_add(len))
            .filter(|end| *end <= file.len())
            .ok_or_else(|| PackError::Corrupt {
                offset,
                reason: format!("recorded length {total} extends beyond file"),
            })?;
        Self::parse(file[start..end].to_vec(), offset)
    }

    /// Open an archive appended to an executable with
    /// [`embed`](crate::embed).
    pub fn open_embedded(path: &Path) -> PackResult<Self> {
        let file = std::fs::read(path)?;
        let offset = embedded_offset(&file)
            .ok_or_else(|| PackError::NoEmbeddedArchive(path.display().to_string()))?;
        let end = file.len() - EMBED_FOOTER_LEN;
        let start = offset as usize;
        Self::parse(file[start..end].to_vec(), offset)
    }

    fn parse(data: Vec<u8>, base_offset: u64) -> PackResult<Self> {
        if data.len() < HEADER_LEN + 4 + TRAILER_LEN {
            return Err(PackError::Corrupt {
                offset: 0,
                reason: "archive data too short".into(),
            });
        }
        if &data[0..4] != ARCHIVE_MAGIC {
            return Err(PackError::InvalidMagic {
                expected: String::from_utf8_lossy(ARCHIVE_MAGIC).into(),
                actual: String::from_utf8_lossy(&data[0..4]).into(),
            });
        }
        let version = read_u32(&data[4..8]);
        if version != FORMAT_VERSION {
            return Err(PackError::UnsupportedVersion(version));
        }
        if read_u64(&data[8..16]) != data.len() as u64 {
            return Err(PackError::Corrupt {
                offset: 8,
                reason: "recorded length does not match archive size".into(),
            });
        }

        let body_end = data.len() - TRAILER_LEN;
        if blake3::hash(&data[..body_end]).as_bytes() != &data[body_end..] {
            return Err(PackError::ChecksumMismatch);
        }

        let dir_offset = read_u64(&data[16..24]);
        let entries = parse_directory(&data[..body_end], dir_offset)?;
        let by_path = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.path.clone(), i))
            .collect();

        Ok(Self {
            data,
            base_offset,
            entries,
            by_path,
        })
    }

    /// Read and decompress a file. `path` may carry a `project://` prefix.
    pub fn read(&self, path: &str) -> PackResult<Vec<u8>> {
        let key = entry_key(path)?;
        let index = *self
            .by_path
            .get(&key)
            .ok_or_else(|| PackError::FileNotFound(key.clone()))?;
        self.read_entry(&self.entries[index])
    }

    pub(crate) fn read_entry(&self, entry: &ArchiveEntry) -> PackResult<Vec<u8>> {
        let start = entry.offset as usize;
        let end = start + entry.compressed_size as usize;
        let compressed = &self.data[start..end];

        if crc32fast::hash(compressed) != entry.crc32 {
            return Err(PackError::CrcMismatch {
                path: entry.path.clone(),
            });
        }

        let decompressed = zstd::decode_all(compressed)
            .map_err(|e| PackError::DecompressionFailed(e.to_string()))?;
        if decompressed.len() as u64 != entry.size {
            return Err(PackError::Corrupt {
                offset: entry.offset,
                reason: format!(
                    "size mismatch: expected {}, got {}",
                    entry.size,
                    decompressed.len()
                ),
            });
        }
        Ok(decompressed)
    }

    pub fn contains(&self, path: &str) -> bool {
        entry_key(path)
            .map(|key| self.by_path.contains_key(&key))
            .unwrap_or(false)
    }

    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    /// Directory records in archive order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// BLAKE3 checksum stored in the trailer.
    pub fn checksum(&self) -> [u8; 32] {
        let mut checksum = [0u8; 32];
        checksum.copy_from_slice(&self.data[self.data.len() - TRAILER_LEN..]);
        checksum
    }
}

/// Offset of an archive embedded at the end of `file`, if there is one.
pub fn embedded_offset(file: &[u8]) -> Option<u64> {
    if file.len() < EMBED_FOOTER_LEN {
        return None;
    }
    let footer = &file[file.len() - EMBED_FOOTER_LEN..];
    if &footer[8..] != EMBED_MAGIC {
        return None;
    }
    let len = read_u64(&footer[..8]);
    let available = (file.len() - EMBED_FOOTER_LEN) as u64;
    if len > available {
        return None;
    }
    Some(available - len)
}

fn parse_directory(body: &[u8], dir_offset: u64) -> PackResult<Vec<ArchiveEntry>> {
    let corrupt = |offset: usize, reason: &str| PackError::Corrupt {
        offset: offset as u64,
        reason: reason.to_string(),
    };

    let mut pos = usize::try_from(dir_offset).unwrap_or(usize::MAX);
    if pos < HEADER_LEN || pos.checked_add(4).map_or(true, |end| end > body.len()) {
        return Err(corrupt(16, "directory offset out of range"));
    }
    let count = read_u32(&body[pos..pos + 4]) as usize;
    pos += 4;

    let mut entries = Vec::with_capacity(count.min(body.len()));
    for _ in 0..count {
        let (path_len, consumed) = decode_varint(&body[pos..], pos as u64)?;
        pos += consumed;
        let path_end = pos
            .checked_add(path_len as usize)
            .filter(|end| *end <= body.len())
            .ok_or_else(|| corrupt(pos, "path extends beyond directory"))?;
        let path = std::str::from_utf8(&body[pos..path_end])
            .map_err(|_| corrupt(pos, "path is not UTF-8"))?
            .to_string();
        pos = path_end;

        if pos + 8 > body.len() {
            return Err(corrupt(pos, "truncated directory record"));
        }
        let offset = read_u64(&body[pos..pos + 8]);
        pos += 8;
        let (size, consumed) = decode_varint(&body[pos..], pos as u64)?;
        pos += consumed;
        let (compressed_size, consumed) = decode_varint(&body[pos..], pos as u64)?;
        pos += consumed;
        if pos + 4 > body.len() {
            return Err(corrupt(pos, "truncated directory record"));
        }
        let crc32 = read_u32(&body[pos..pos + 4]);
        pos += 4;

        let in_bounds = offset >= HEADER_LEN as u64
            && offset
                .checked_add(compressed_size)
                .is_some_and(|end| end <= dir_offset);
        if !in_bounds {
            return Err(corrupt(offset as usize, "entry payload outside data section"));
        }

        entries.push(ArchiveEntry {
            path,
            offset,
            size,
            compressed_size,
            crc32,
        });
    }
    Ok(entries)
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_be_bytes(buf)
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_be_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{embed_bytes, ArchiveWriter};

    fn sample() -> Vec<u8> {
        let mut writer = ArchiveWriter::new();
        writer.add_file("project.settings", b"{\"config_version\":5}").unwrap();
        writer.add_file("levels/one.lvl", &[7u8; 4096]).unwrap();
        writer.finish_to_bytes().unwrap()
    }

    // -----------------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------------

    #[test]
    fn read_written_files() {
        let reader = ArchiveReader::from_bytes(sample()).unwrap();
        assert_eq!(reader.file_count(), 2);
        assert_eq!(reader.read("project.settings").unwrap(), b"{\"config_version\":5}");
        assert_eq!(reader.read("project://levels/one.lvl").unwrap(), vec![7u8; 4096]);
        assert!(reader.contains("levels/./one.lvl"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let reader = ArchiveReader::from_bytes(sample()).unwrap();
        let err = reader.read("nope.txt").unwrap_err();
        assert!(matches!(err, PackError::FileNotFound(p) if p == "nope.txt"));
    }

    #[test]
    fn empty_archive_is_valid() {
        let bytes = ArchiveWriter::new().finish_to_bytes().unwrap();
        let reader = ArchiveReader::from_bytes(bytes).unwrap();
        assert_eq!(reader.file_count(), 0);
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    #[test]
    fn bad_magic_rejected() {
        let mut bytes = sample();
        bytes[0] = b'X';
        assert!(matches!(
            ArchiveReader::from_bytes(bytes),
            Err(PackError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn flipped_payload_byte_fails_checksum() {
        let mut bytes = sample();
        bytes[HEADER_LEN + 1] ^= 0xFF;
        assert!(matches!(
            ArchiveReader::from_bytes(bytes),
            Err(PackError::ChecksumMismatch)
        ));
    }

    #[test]
    fn truncated_archive_rejected() {
        let bytes = sample();
        let cut = bytes[..bytes.len() - 1].to_vec();
        assert!(ArchiveReader::from_bytes(cut).is_err());
        assert!(ArchiveReader::from_bytes(vec![0u8; 3]).is_err());
    }

    // -----------------------------------------------------------------------
    // Offsets and embedding
    // -----------------------------------------------------------------------

    #[test]
    fn open_at_offset_inside_larger_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.bin");
        let mut file = b"some leading bytes".to_vec();
        let offset = file.len() as u64;
        file.extend_from_slice(&sample());
        file.extend_from_slice(b"trailing junk");
        std::fs::write(&path, &file).unwrap();

        let reader = ArchiveReader::open_at(&path, offset).unwrap();
        assert_eq!(reader.base_offset(), offset);
        assert!(reader.contains("project.settings"));
    }

    #[test]
    fn open_at_wrong_offset_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.pck");
        std::fs::write(&path, sample()).unwrap();
        assert!(ArchiveReader::open_at(&path, 3).is_err());
        assert!(ArchiveReader::open_at(&path, 1 << 40).is_err());
    }

    #[test]
    fn open_embedded_finds_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game");
        std::fs::write(&path, embed_bytes(b"\x7fELF fake executable", &sample())).unwrap();

        let reader = ArchiveReader::open_embedded(&path).unwrap();
        assert_eq!(reader.base_offset(), 20);
        assert_eq!(reader.file_count(), 2);
    }

    #[test]
    fn plain_executable_has_no_embedded_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game");
        std::fs::write(&path, b"\x7fELF just code").unwrap();
        assert!(matches!(
            ArchiveReader::open_embedded(&path),
            Err(PackError::NoEmbeddedArchive(_))
        ));
    }

    #[test]
    fn bogus_embed_length_is_ignored() {
        let mut file = b"tiny".to_vec();
        file.extend_from_slice(&u64::MAX.to_be_bytes());
        file.extend_from_slice(EMBED_MAGIC);
        assert_eq!(embedded_offset(&file), None);
    }
}
