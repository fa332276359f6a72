//! Archive locations derived from the host executable.

use std::fmt;
use std::path::{Path, PathBuf};

/// File-name suffixes that distinguish builds of one executable per
/// platform, architecture or build profile. `game.linux.x86_64` and
/// `game.exe` both share the archive `game.pck`.
pub const PLATFORM_SUFFIXES: &[&str] = &[
    ".exe", ".x86_64", ".x86_32", ".arm64", ".arm32", ".rv64", ".universal", ".linux",
    ".windows", ".macos", ".debug", ".release", ".console",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandidateKind {
    /// Appended to the executable itself.
    Embedded,
    /// `<exe_dir>/<exe_stem>.<ext>`
    BesideExecutable,
    /// `<exe_dir>/<exe_name without platform suffixes>.<ext>`
    BaseName,
    /// `<exe_dir>/<data_dir>/<exe_stem>.<ext>`
    DataDir,
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Embedded => "embedded",
            Self::BesideExecutable => "beside-executable",
            Self::BaseName => "base-name",
            Self::DataDir => "data-dir",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub kind: CandidateKind,
    pub path: PathBuf,
}

/// Strip every trailing [`PLATFORM_SUFFIXES`] entry from `file_name`.
pub fn strip_platform_suffixes(file_name: &str) -> &str {
    let mut name = file_name;
    loop {
        let stripped = PLATFORM_SUFFIXES
            .iter()
            .find_map(|suffix| name.strip_suffix(suffix))
            .filter(|rest| !rest.is_empty());
        match stripped {
            Some(rest) => name = rest,
            None => return name,
        }
    }
}

/// Candidate archive locations for `executable`, in probe order.
///
/// Kinds that derive the same path as an earlier candidate are dropped, so
/// no path is probed twice.
pub fn archive_candidates(executable: &Path, extension: &str, data_dir: &str) -> Vec<Candidate> {
    let dir = executable.parent().unwrap_or_else(|| Path::new(""));
    let file_name = executable
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = executable
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = strip_platform_suffixes(&file_name);

    let archive = |name: &str| format!("{name}.{extension}");
    let all = [
        (CandidateKind::Embedded, executable.to_path_buf()),
        (CandidateKind::BesideExecutable, dir.join(archive(&stem))),
        (CandidateKind::BaseName, dir.join(archive(base))),
        (CandidateKind::DataDir, dir.join(data_dir).join(archive(&stem))),
    ];

    let mut candidates: Vec<Candidate> = Vec::with_capacity(all.len());
    for (kind, path) in all {
        if candidates.iter().any(|c| c.path == path) {
            continue;
        }
        candidates.push(Candidate { kind, path });
    }
    candidates
}
