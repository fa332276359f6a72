//! Project setup.
//!
//! [`ArchiveLoader::load`] finds the project's settings and loads them into
//! a [`Project`]:
//!
//! 1. An explicit main archive is mounted, or else candidate archives derived
//!    from the executable are probed in order until one mounts.
//! 2. Settings are read from the mounted archive, or else searched for in
//!    the project directory.
//! 3. Loaded values are migrated to the current format.
//! 4. The override file, then any file named by
//!    `application/config/project_settings_override`, is applied on top.
//!
//! Finding nothing at all is not an error: the project becomes ready with
//! an empty store.

use std::fmt;
use std::path::{Path, PathBuf};

use strata_codec::{BinaryCodec, SettingsCodec, SettingsDocument, TextCodec};
use strata_path::PROJECT_PREFIX;

use crate::candidates::{archive_candidates, Candidate, CandidateKind};
use crate::config::LoaderConfig;
use crate::error::{LoadError, LoadResult};
use crate::project::Project;

/// Binary settings file name, tried first.
pub const SETTINGS_BINARY: &str = "project.binary";
/// Text settings file name.
pub const SETTINGS_TEXT: &str = "project.settings";

/// Where the ready project's settings came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadySource {
    Archive,
    Filesystem,
    Empty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    ProbingMainArchive,
    Mounting,
    LoadingSettings,
    Migrating,
    Ready(ReadySource),
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::ProbingMainArchive => f.write_str("probing-main-archive"),
            Self::Mounting => f.write_str("mounting"),
            Self::LoadingSettings => f.write_str("loading-settings"),
            Self::Migrating => f.write_str("migrating"),
            Self::Ready(source) => write!(f, "ready({source:?})"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    Mounted,
    Failed(String),
}

/// One archive location tried during setup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Probe {
    /// `None` for an explicit main archive.
    pub kind: Option<CandidateKind>,
    pub path: PathBuf,
    pub outcome: ProbeOutcome,
}

/// What setup did, step by step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub states: Vec<LoadState>,
    pub probes: Vec<Probe>,
    /// Primary settings file, as a virtual or real path.
    pub settings_file: Option<String>,
    pub format_version: Option<u32>,
    pub settings_loaded: usize,
    pub migrated: usize,
    pub override_file: Option<String>,
    pub settings_override: Option<String>,
}

impl LoadReport {
    pub fn mounted(&self) -> Option<&Probe> {
        self.probes.iter().find(|p| p.outcome == ProbeOutcome::Mounted)
    }
}

/// Drives project setup through [`LoadState`].
#[derive(Debug)]
pub struct ArchiveLoader {
    config: LoaderConfig,
    state: LoadState,
    report: LoadReport,
}

impl ArchiveLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            state: LoadState::Idle,
            report: LoadReport {
                states: vec![LoadState::Idle],
                ..Default::default()
            },
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    fn enter(&mut self, state: LoadState) {
        tracing::debug!(from = %self.state, to = %state, "loader state");
        self.state = state;
        self.report.states.push(state);
    }

    /// Run setup against `project`.
    pub fn load(&mut self, project: &mut Project) -> LoadResult<LoadReport> {
        self.enter(LoadState::ProbingMainArchive);

        let source = match self.config.main_pack.clone() {
            Some(main_pack) => self.load_main_pack(project, &main_pack)?,
            None => self.load_discovered(project)?,
        };

        self.enter(LoadState::Ready(source));
        project.mark_loaded();

        if let Some((path, count)) = project.load_settings_override() {
            tracing::debug!(path = %path, settings = count, "applied project settings override");
            self.report.settings_override = Some(path);
        }

        tracing::info!(
            source = ?source,
            settings = project.store().len(),
            archives = project.manifest().archive_count(),
            "project ready"
        );
        Ok(self.report.clone())
    }

    fn load_main_pack(&mut self, project: &mut Project, main_pack: &Path) -> LoadResult<ReadySource> {
        self.enter(LoadState::Mounting);
        if let Err(source) = project.manifest_mut().mount(main_pack, false, 0) {
            self.record_probe(None, main_pack, ProbeOutcome::Failed(source.to_string()));
            return Err(LoadError::CannotOpen {
                path: main_pack.to_path_buf(),
                source,
            });
        }
        self.record_probe(None, main_pack, ProbeOutcome::Mounted);

        self.enter(LoadState::LoadingSettings);
        let doc = self.load_archive_settings(project)?;
        self.finish_primary(project, doc);

        if !self.config.ignore_override {
            let dir = main_pack.parent().unwrap_or_else(|| Path::new(""));
            self.load_override(project, &dir.join(&self.config.override_file));
        }
        Ok(ReadySource::Archive)
    }

    fn load_discovered(&mut self, project: &mut Project) -> LoadResult<ReadySource> {
        if let Some(executable) = self.config.executable.clone() {
            let candidates = archive_candidates(
                &executable,
                &self.config.archive_extension,
                &self.config.data_dir_name,
            );
            if self.probe_candidates(project, &candidates) {
                self.enter(LoadState::LoadingSettings);
                let doc = self.load_archive_settings(project)?;
                self.finish_primary(project, doc);

                if !self.config.ignore_override {
                    let dir = executable.parent().unwrap_or_else(|| Path::new(""));
                    self.load_override(project, &dir.join(&self.config.override_file));
                }
                return Ok(ReadySource::Archive);
            }
        }

        self.enter(LoadState::LoadingSettings);
        let Some((dir, doc)) = self.search_filesystem(project)? else {
            tracing::debug!(root = %self.config.search_root().display(), "no settings found");
            return Ok(ReadySource::Empty);
        };
        project
            .paths_mut()
            .set_project_root(&dir.to_string_lossy());
        self.finish_primary(project, doc);

        if !self.config.ignore_override {
            self.load_override(project, &dir.join(&self.config.override_file));
        }
        Ok(ReadySource::Filesystem)
    }

    /// Mount the first candidate that opens. Returns `true` if one did.
    fn probe_candidates(&mut self, project: &mut Project, candidates: &[Candidate]) -> bool {
        for candidate in candidates {
            let mounted = match candidate.kind {
                CandidateKind::Embedded => project.manifest_mut().mount_embedded(&candidate.path, false),
                _ => project.manifest_mut().mount(&candidate.path, false, 0),
            };
            match mounted {
                Ok(_) => {
                    self.enter(LoadState::Mounting);
                    self.record_probe(Some(candidate.kind), &candidate.path, ProbeOutcome::Mounted);
                    return true;
                }
                Err(e) => {
                    tracing::debug!(path = %candidate.path.display(), kind = %candidate.kind, error = %e, "archive probe failed");
                    self.record_probe(Some(candidate.kind), &candidate.path, ProbeOutcome::Failed(e.to_string()));
                }
            }
        }
        false
    }

    fn record_probe(&mut self, kind: Option<CandidateKind>, path: &Path, outcome: ProbeOutcome) {
        self.report.probes.push(Probe {
            kind,
            path: path.to_path_buf(),
            outcome,
        });
    }

    /// Read settings from the mounted archives, binary first.
    fn load_archive_settings(&mut self, project: &Project) -> LoadResult<SettingsDocument> {
        let binary = format!("{PROJECT_PREFIX}{SETTINGS_BINARY}");
        let text = format!("{PROJECT_PREFIX}{SETTINGS_TEXT}");
        let sources: [(String, &dyn SettingsCodec); 2] = [(binary, &BinaryCodec), (text, &TextCodec)];
        for (path, codec) in sources {
            if !project.manifest().contains(&path) {
                continue;
            }
            let doc = project.read_document(&path, codec)?;
            self.report.settings_file = Some(path);
            return Ok(doc);
        }
        Err(LoadError::NotFound(format!("{PROJECT_PREFIX}{SETTINGS_TEXT}")))
    }

    /// Look for a settings file in the search root, and in its parents when
    /// searching upwards.
    fn search_filesystem(&mut self, project: &Project) -> LoadResult<Option<(PathBuf, SettingsDocument)>> {
        let root = self.config.search_root();
        let start = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let upwards = self.config.upwards && self.config.resource_dir.is_none();

        let mut dir = Some(start.as_path());
        while let Some(current) = dir {
            if let Some((path, doc)) = read_settings_in(project, current)? {
                self.report.settings_file = Some(path);
                return Ok(Some((current.to_path_buf(), doc)));
            }
            if !upwards {
                break;
            }
            dir = current.parent();
        }
        Ok(None)
    }

    fn finish_primary(&mut self, project: &Project, doc: SettingsDocument) {
        self.report.format_version = doc.version;
        let version = doc.version;
        self.report.settings_loaded = project.apply_document(doc);

        self.enter(LoadState::Migrating);
        self.report.migrated = project.store().migrate(version);
    }

    fn load_override(&mut self, project: &Project, path: &Path) {
        let path = path.to_string_lossy().into_owned();
        if let Some(count) = project.load_optional_text(&path) {
            tracing::debug!(path = %path, settings = count, "applied override file");
            self.report.override_file = Some(path);
        }
    }
}

/// Read `project.binary` or `project.settings` from `dir`.
fn read_settings_in(project: &Project, dir: &Path) -> LoadResult<Option<(String, SettingsDocument)>> {
    let candidates: [(&str, &dyn SettingsCodec); 2] =
        [(SETTINGS_BINARY, &BinaryCodec), (SETTINGS_TEXT, &TextCodec)];
    for (name, codec) in candidates {
        let path = dir.join(name).to_string_lossy().into_owned();
        match project.read_document(&path, codec) {
            Ok(doc) => return Ok(Some((path, doc))),
            Err(LoadError::NotFound(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}
