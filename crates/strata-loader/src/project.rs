use std::path::Path;
use std::sync::Arc;

use strata_codec::{codec_for_path, SettingsCodec, SettingsDocument, TextCodec};
use strata_pack::{Manifest, MountReport};
use strata_path::{PathVirtualizer, PROJECT_PREFIX};
use strata_store::migrate::migrate_entries;
use strata_store::{BuildFeatures, FeatureSource, PropertyStore, CURRENT_FORMAT_VERSION};
use strata_types::{Value, CUSTOM_FEATURES_KEY};

use crate::config::LoaderConfig;
use crate::error::{LoadError, LoadResult};
use crate::hooks::{MountHooks, NoOpHooks};

/// Setting naming the project's declared feature list.
pub const FEATURES_SETTING: &str = "application/config/features";

/// Setting naming an extra settings file loaded after setup.
pub const SETTINGS_OVERRIDE_SETTING: &str = "application/config/project_settings_override";

/// A project: its settings store, virtual roots and mounted archives.
///
/// The store is shared through [`Arc`]; everything else is owned here and
/// mutated only during setup or by explicit calls.
pub struct Project {
    store: Arc<PropertyStore>,
    paths: PathVirtualizer,
    manifest: Manifest,
    hooks: Arc<dyn MountHooks>,
    loaded: bool,
}

impl Project {
    pub fn new(paths: PathVirtualizer, features: Arc<dyn FeatureSource>) -> Self {
        Self {
            store: Arc::new(PropertyStore::with_features(features)),
            paths,
            manifest: Manifest::new(),
            hooks: Arc::new(NoOpHooks),
            loaded: false,
        }
    }

    /// Project with roots taken from `config`.
    pub fn from_config(config: &LoaderConfig, features: Arc<dyn FeatureSource>) -> Self {
        let paths = PathVirtualizer::new(config.search_root(), &config.user_data_dir);
        let mut project = Self::new(paths, features);
        project.manifest.set_disabled(config.disable_archives);
        project
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn MountHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn store(&self) -> &Arc<PropertyStore> {
        &self.store
    }

    pub fn paths(&self) -> &PathVirtualizer {
        &self.paths
    }

    pub(crate) fn paths_mut(&mut self) -> &mut PathVirtualizer {
        &mut self.paths
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub(crate) fn manifest_mut(&mut self) -> &mut Manifest {
        &mut self.manifest
    }

    /// Returns `true` once setup has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Returns `true` if at least one archive is mounted.
    pub fn using_archive(&self) -> bool {
        self.manifest.archive_count() > 0
    }

    // -----------------------------------------------------------------------
    // Paths
    // -----------------------------------------------------------------------

    /// Real path to `project://` path. See [`PathVirtualizer::to_virtual`].
    pub fn localize_path(&self, path: &str) -> Option<String> {
        self.paths.to_virtual(path)
    }

    /// `project://`/`user://` path to real path.
    pub fn globalize_path(&self, path: &str) -> String {
        self.paths.to_real(path)
    }

    /// Read a file by virtual or real path. `project://` paths are served
    /// from mounted archives first, then from the project directory.
    pub fn read_file(&self, path: &str) -> LoadResult<Vec<u8>> {
        if path.starts_with(PROJECT_PREFIX) && self.manifest.contains(path) {
            return Ok(self.manifest.read(path)?);
        }
        let real = self.paths.to_real(path);
        match std::fs::read(&real) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LoadError::NotFound(path.to_string())),
            Err(e) => Err(LoadError::Io(e)),
        }
    }

    // -----------------------------------------------------------------------
    // Archives
    // -----------------------------------------------------------------------

    /// Mount an additional archive.
    ///
    /// After setup, a successful mount also refreshes the host's global
    /// class registry and id cache through the installed [`MountHooks`].
    pub fn load_resource_pack(&mut self, path: &Path, replace: bool, offset: u64) -> LoadResult<MountReport> {
        let report = self.manifest.mount(path, replace, offset)?;
        if self.loaded {
            self.hooks.refresh_global_classes();
            self.hooks.reload_uid_cache();
        }
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Settings files
    // -----------------------------------------------------------------------

    /// Decode the settings file at `path` with `codec`.
    pub fn read_document(&self, path: &str, codec: &dyn SettingsCodec) -> LoadResult<SettingsDocument> {
        let bytes = self.read_file(path)?;
        let doc = codec.decode(&bytes).map_err(|source| LoadError::Parse {
            path: path.to_string(),
            source,
        })?;
        if let Some(found) = doc.version.filter(|v| *v > CURRENT_FORMAT_VERSION) {
            return Err(LoadError::NewerFormat {
                path: path.to_string(),
                found,
                supported: CURRENT_FORMAT_VERSION,
            });
        }
        tracing::debug!(path, codec = codec.name(), entries = doc.len(), "read settings file");
        Ok(doc)
    }

    /// Insert a document's entries into the store in file order, without
    /// migrating them.
    pub(crate) fn apply_document(&self, doc: SettingsDocument) -> usize {
        let count = doc.entries.len();
        for (name, value) in doc.entries {
            self.store.set(&name, value);
        }
        count
    }

    /// Load a settings file on top of the current settings, migrating its
    /// entries first. Returns the number of settings applied.
    pub fn load_settings_file(&self, path: &str) -> LoadResult<usize> {
        let mut doc = self.read_document(path, codec_for_path(path))?;
        migrate_entries(doc.version, &mut doc.entries);
        Ok(self.apply_document(doc))
    }

    /// Load a text settings file, logging instead of failing.
    pub(crate) fn load_optional_text(&self, path: &str) -> Option<usize> {
        let loaded = self.read_document(path, &TextCodec).map(|mut doc| {
            migrate_entries(doc.version, &mut doc.entries);
            self.apply_document(doc)
        });
        match loaded {
            Ok(count) => Some(count),
            Err(LoadError::NotFound(_)) => None,
            Err(e) => {
                tracing::warn!(path, error = %e, "skipping override settings file");
                None
            }
        }
    }

    /// Load the file named by [`SETTINGS_OVERRIDE_SETTING`], if set.
    pub(crate) fn load_settings_override(&self) -> Option<(String, usize)> {
        let path = match self.store.get(SETTINGS_OVERRIDE_SETTING) {
            Ok(Value::String(path)) if !path.is_empty() => path,
            _ => return None,
        };
        self.load_optional_text(&path).map(|count| (path, count))
    }

    /// Write customized settings to `path`.
    ///
    /// Settings hidden from the editor and settings still equal to their
    /// initial value are skipped. Custom features are written under
    /// `_custom_features`. `.binary` paths use the binary codec; anything
    /// else is written as text. Returns the number of settings written.
    pub fn save_custom(&self, path: &str) -> LoadResult<usize> {
        let mut doc = SettingsDocument::new(Some(CURRENT_FORMAT_VERSION));
        for entry in self.store.entries_ordered() {
            if entry.hide_from_editor || entry.initial.as_ref() == Some(&entry.value) {
                continue;
            }
            doc.push(entry.name, entry.value);
        }
        let custom = self.store.custom_features();
        if !custom.is_empty() {
            doc.push(CUSTOM_FEATURES_KEY, Value::String(custom.join(",")));
        }

        let bytes = codec_for_path(path).encode(&doc)?;
        let real = self.paths.to_real(path);
        std::fs::write(&real, bytes)?;
        tracing::debug!(path, real = %real, settings = doc.len(), "saved settings");
        Ok(doc.len())
    }

    // -----------------------------------------------------------------------
    // Features
    // -----------------------------------------------------------------------

    /// The project's declared features.
    pub fn project_features(&self) -> Vec<String> {
        match self.store.get(FEATURES_SETTING) {
            Ok(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Ok(Value::String(list)) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Declared features `build` cannot honor.
    pub fn unsupported_features(&self, build: &BuildFeatures) -> Vec<String> {
        build.unsupported(&self.project_features())
    }
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("store", &self.store)
            .field("paths", &self.paths)
            .field("archives", &self.manifest.archive_count())
            .field("loaded", &self.loaded)
            .finish()
    }
}
