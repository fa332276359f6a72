//! Resource archive format for Strata.
//!
//! An archive bundles a project's files (settings included) into a single
//! zstd-compressed, CRC-checked file that can stand alone or ride along at
//! the end of an executable.
//!
//! # Layout
//!
//! - **Header**: `STRP` magic, format version, total length, directory offset
//! - **Payloads**: one zstd frame per file
//! - **Directory**: path, payload offset, sizes and CRC32 for each file
//! - **Trailer**: BLAKE3 checksum of everything before it
//!
//! An embedded archive is followed by its length and the `STRE` magic so
//! readers can locate it from the end of the host file.
//!
//! # Components
//!
//! - [`ArchiveWriter`]: builds archives from files or directories
//! - [`ArchiveReader`]: validates and reads one archive
//! - [`Manifest`]: overlay of mounted archives with replace semantics

pub mod entry;
pub mod error;
pub mod manifest;
pub mod reader;
pub mod writer;

pub use entry::{entry_key, ArchiveEntry, ARCHIVE_MAGIC, EMBED_MAGIC, FORMAT_VERSION};
pub use error::{PackError, PackResult};
pub use manifest::{Manifest, MountReport, MountedArchive};
pub use reader::{embedded_offset, ArchiveReader};
pub use writer::{embed, embed_bytes, ArchiveFile, ArchiveWriter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_file_then_mount() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.pck");

        let mut writer = ArchiveWriter::new();
        for i in 0..10 {
            writer
                .add_file(&format!("levels/{i}.lvl"), format!("level-{i}").as_bytes())
                .unwrap();
        }
        let written = writer.finish(&path).unwrap();
        assert_eq!(written.file_count, 10);

        let reader = ArchiveReader::open(&path).unwrap();
        assert_eq!(reader.checksum(), written.checksum);

        let mut manifest = Manifest::new();
        manifest.mount(&path, false, 0).unwrap();
        for i in 0..10 {
            let data = manifest.read(&format!("project://levels/{i}.lvl")).unwrap();
            assert_eq!(data, format!("level-{i}").as_bytes());
        }
    }

    #[test]
    fn embed_file_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("game");
        let pck = dir.path().join("game.pck");
        let out = dir.path().join("game.bundled");
        std::fs::write(&exe, b"#!/bin/sh\necho hi\n").unwrap();

        let mut writer = ArchiveWriter::new();
        writer.add_file("project.settings", b"{}").unwrap();
        writer.finish(&pck).unwrap();

        let offset = embed(&exe, &pck, &out).unwrap();
        let reader = ArchiveReader::open_embedded(&out).unwrap();
        assert_eq!(reader.base_offset(), offset);
        assert_eq!(reader.read("project.settings").unwrap(), b"{}");
    }
}
