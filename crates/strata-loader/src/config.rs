use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, LoadResult};

/// Inputs to project setup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directory searched for settings when no archive is found.
    pub project_dir: PathBuf,
    /// Archive to load instead of probing. Failing to open it is fatal.
    pub main_pack: Option<PathBuf>,
    /// Search parent directories of `project_dir` for a settings file.
    pub upwards: bool,
    /// Skip the override file.
    pub ignore_override: bool,
    /// Host executable, used to derive archive candidates.
    pub executable: Option<PathBuf>,
    /// Project root imposed by the OS. Replaces `project_dir` when set.
    pub resource_dir: Option<PathBuf>,
    /// Root of the `user://` namespace.
    pub user_data_dir: PathBuf,
    pub archive_extension: String,
    pub override_file: String,
    /// Subdirectory of the executable's directory probed last.
    pub data_dir_name: String,
    /// Refuse to mount any archive.
    pub disable_archives: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            main_pack: None,
            upwards: false,
            ignore_override: false,
            executable: None,
            resource_dir: None,
            user_data_dir: PathBuf::new(),
            archive_extension: "pck".into(),
            override_file: "override.cfg".into(),
            data_dir_name: "data".into(),
            disable_archives: false,
        }
    }
}

impl LoaderConfig {
    pub fn from_toml_str(text: &str) -> LoadResult<Self> {
        toml::from_str(text).map_err(|e| LoadError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> LoadResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> LoadResult<String> {
        toml::to_string_pretty(self).map_err(|e| LoadError::Config(e.to_string()))
    }

    /// Directory the filesystem search starts in.
    pub fn search_root(&self) -> &Path {
        self.resource_dir.as_deref().unwrap_or(&self.project_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = LoaderConfig::default();
        assert_eq!(c.project_dir, PathBuf::from("."));
        assert_eq!(c.archive_extension, "pck");
        assert_eq!(c.override_file, "override.cfg");
        assert_eq!(c.data_dir_name, "data");
        assert!(c.main_pack.is_none());
        assert!(!c.upwards);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = LoaderConfig::from_toml_str(
            r#"
            project_dir = "/games/demo"
            upwards = true
            "#,
        )
        .unwrap();
        assert_eq!(c.project_dir, PathBuf::from("/games/demo"));
        assert!(c.upwards);
        assert_eq!(c.override_file, "override.cfg");
    }

    #[test]
    fn toml_text_reloads_equal() {
        let c = LoaderConfig {
            main_pack: Some("/opt/game/game.pck".into()),
            ..Default::default()
        };
        let text = c.to_toml_string().unwrap();
        assert_eq!(LoaderConfig::from_toml_str(&text).unwrap(), c);
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = LoaderConfig::from_toml_str("upwards = \"yes\"").unwrap_err();
        assert!(matches!(err, LoadError::Config(_)));
    }

    #[test]
    fn resource_dir_overrides_search_root() {
        let c = LoaderConfig {
            resource_dir: Some("/sandbox/res".into()),
            ..Default::default()
        };
        assert_eq!(c.search_root(), Path::new("/sandbox/res"));
    }
}
