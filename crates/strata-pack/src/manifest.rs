use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::entry::entry_key;
use crate::error::{PackError, PackResult};
use crate::reader::ArchiveReader;

/// One archive in the mount list.
#[derive(Debug)]
pub struct MountedArchive {
    pub source: PathBuf,
    pub offset: u64,
    reader: Arc<ArchiveReader>,
}

impl MountedArchive {
    pub fn file_count(&self) -> usize {
        self.reader.file_count()
    }
}

/// Outcome of a single mount.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MountReport {
    /// Paths that were not previously mounted.
    pub added: usize,
    /// Paths that now resolve to the new archive instead of an older one.
    pub replaced: usize,
    /// Paths left pointing at an older archive.
    pub skipped: usize,
}

#[derive(Clone, Copy, Debug)]
struct FileRef {
    archive: usize,
    entry: usize,
}

/// Overlay of mounted archives.
///
/// Each file path resolves to exactly one archive. A later mount takes over
/// paths it shares with earlier mounts only when mounted with `replace`;
/// otherwise the earlier archive keeps them. Archives are never unmounted.
#[derive(Debug, Default)]
pub struct Manifest {
    archives: Vec<MountedArchive>,
    files: HashMap<String, FileRef>,
    disabled: bool,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse all further mounts, e.g. when the host disables archive
    /// loading from the command line.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Mount the archive that starts `offset` bytes into `path`.
    pub fn mount(&mut self, path: &Path, replace: bool, offset: u64) -> PackResult<MountReport> {
        self.ensure_enabled()?;
        let reader = ArchiveReader::open_at(path, offset)?;
        Ok(self.mount_reader(path, reader, replace))
    }

    /// Mount the archive embedded at the end of the executable at `path`.
    pub fn mount_embedded(&mut self, path: &Path, replace: bool) -> PackResult<MountReport> {
        self.ensure_enabled()?;
        let reader = ArchiveReader::open_embedded(path)?;
        Ok(self.mount_reader(path, reader, replace))
    }

    fn ensure_enabled(&self) -> PackResult<()> {
        if self.disabled {
            return Err(PackError::Disabled);
        }
        Ok(())
    }

    fn mount_reader(&mut self, source: &Path, reader: ArchiveReader, replace: bool) -> MountReport {
        let archive = self.archives.len();
        let mut report = MountReport::default();

        for (entry, record) in reader.entries().iter().enumerate() {
            let new_ref = FileRef { archive, entry };
            match self.files.get_mut(&record.path) {
                None => {
                    self.files.insert(record.path.clone(), new_ref);
                    report.added += 1;
                }
                Some(existing) if replace => {
                    *existing = new_ref;
                    report.replaced += 1;
                }
                Some(_) => report.skipped += 1,
            }
        }

        tracing::debug!(
            source = %source.display(),
            offset = reader.base_offset(),
            added = report.added,
            replaced = report.replaced,
            skipped = report.skipped,
            "mounted archive"
        );

        self.archives.push(MountedArchive {
            source: source.to_path_buf(),
            offset: reader.base_offset(),
            reader: Arc::new(reader),
        });
        report
    }

    /// Read a mounted file. Accepts `project://` paths and bare relative
    /// paths alike.
    pub fn read(&self, path: &str) -> PackResult<Vec<u8>> {
        let key = entry_key(path)?;
        let file = self
            .files
            .get(&key)
            .ok_or_else(|| PackError::FileNotFound(key.clone()))?;
        let reader = &self.archives[file.archive].reader;
        reader.read_entry(&reader.entries()[file.entry])
    }

    pub fn contains(&self, path: &str) -> bool {
        entry_key(path)
            .map(|key| self.files.contains_key(&key))
            .unwrap_or(false)
    }

    /// Source of the archive a path currently resolves to.
    pub fn source_of(&self, path: &str) -> Option<&Path> {
        let key = entry_key(path).ok()?;
        let file = self.files.get(&key)?;
        Some(self.archives[file.archive].source.as_path())
    }

    /// Total distinct paths across all mounted archives.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn archive_count(&self) -> usize {
        self.archives.len()
    }

    pub fn archives(&self) -> &[MountedArchive] {
        &self.archives
    }

    /// Every mounted path, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.files.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{embed_bytes, ArchiveWriter};

    fn write_archive(dir: &Path, name: &str, files: &[(&str, &[u8])]) -> PathBuf {
        let mut writer = ArchiveWriter::new();
        for (path, data) in files {
            writer.add_file(path, data).unwrap();
        }
        let path = dir.join(name);
        writer.finish(&path).unwrap();
        path
    }

    #[test]
    fn empty_manifest() {
        let manifest = Manifest::new();
        assert_eq!(manifest.archive_count(), 0);
        assert_eq!(manifest.file_count(), 0);
        assert!(!manifest.contains("project://a.txt"));
        assert!(matches!(manifest.read("a.txt"), Err(PackError::FileNotFound(_))));
    }

    #[test]
    fn mount_exposes_files_under_project_paths() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_archive(dir.path(), "a.pck", &[("x.txt", b"x"), ("sub/y.txt", b"y")]);

        let mut manifest = Manifest::new();
        let report = manifest.mount(&a, false, 0).unwrap();
        assert_eq!(report.added, 2);
        assert_eq!(manifest.read("project://sub/y.txt").unwrap(), b"y");
        assert_eq!(manifest.paths(), vec!["sub/y.txt", "x.txt"]);
    }

    #[test]
    fn later_mount_without_replace_keeps_first() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_archive(dir.path(), "a.pck", &[("x.txt", b"from a")]);
        let b = write_archive(dir.path(), "b.pck", &[("x.txt", b"from b"), ("z.txt", b"z")]);

        let mut manifest = Manifest::new();
        manifest.mount(&a, false, 0).unwrap();
        let report = manifest.mount(&b, false, 0).unwrap();

        assert_eq!(report, MountReport { added: 1, replaced: 0, skipped: 1 });
        assert_eq!(manifest.read("x.txt").unwrap(), b"from a");
        assert_eq!(manifest.read("z.txt").unwrap(), b"z");
        assert_eq!(manifest.source_of("x.txt"), Some(a.as_path()));
    }

    #[test]
    fn later_mount_with_replace_wins() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_archive(dir.path(), "a.pck", &[("x.txt", b"from a"), ("only_a", b"a")]);
        let b = write_archive(dir.path(), "b.pck", &[("x.txt", b"from b")]);

        let mut manifest = Manifest::new();
        manifest.mount(&a, false, 0).unwrap();
        manifest.mount(&b, true, 0).unwrap();

        assert_eq!(manifest.read("x.txt").unwrap(), b"from b");
        assert_eq!(manifest.read("only_a").unwrap(), b"a");
        assert_eq!(manifest.archive_count(), 2);
        assert_eq!(manifest.file_count(), 2);
    }

    #[test]
    fn mount_at_offset() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ArchiveWriter::new();
        writer.add_file("x.txt", b"inner").unwrap();
        let mut bundle = vec![0xAB; 100];
        bundle.extend_from_slice(&writer.finish_to_bytes().unwrap());
        let path = dir.path().join("bundle.bin");
        std::fs::write(&path, &bundle).unwrap();

        let mut manifest = Manifest::new();
        manifest.mount(&path, false, 100).unwrap();
        assert_eq!(manifest.archives()[0].offset, 100);
        assert_eq!(manifest.read("x.txt").unwrap(), b"inner");
    }

    #[test]
    fn mount_embedded_archive() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ArchiveWriter::new();
        writer.add_file("project.settings", b"{}").unwrap();
        let exe = dir.path().join("game");
        std::fs::write(&exe, embed_bytes(b"code", &writer.finish_to_bytes().unwrap())).unwrap();

        let mut manifest = Manifest::new();
        manifest.mount_embedded(&exe, false).unwrap();
        assert!(manifest.contains("project://project.settings"));
    }

    #[test]
    fn failed_mount_leaves_manifest_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let junk = dir.path().join("junk.pck");
        std::fs::write(&junk, b"not an archive at all, not even close").unwrap();

        let mut manifest = Manifest::new();
        assert!(manifest.mount(&junk, false, 0).is_err());
        assert!(manifest.mount(&dir.path().join("missing.pck"), false, 0).is_err());
        assert_eq!(manifest.archive_count(), 0);
    }

    #[test]
    fn disabled_manifest_refuses_mounts() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_archive(dir.path(), "a.pck", &[("x.txt", b"x")]);

        let mut manifest = Manifest::new();
        manifest.set_disabled(true);
        assert!(matches!(manifest.mount(&a, false, 0), Err(PackError::Disabled)));
        manifest.set_disabled(false);
        assert!(manifest.mount(&a, false, 0).is_ok());
    }
}
