use std::fs;
use std::path::{Path, PathBuf};

use crate::simplify::{is_absolute_path, is_protocol_qualified, path_join, simplify_path};

/// Marker of the project-relative namespace.
pub const PROJECT_PREFIX: &str = "project://";

/// Marker of the user-data-relative namespace.
pub const USER_PREFIX: &str = "user://";

/// Directory under the project root that holds generated project data.
pub const PROJECT_DATA_DIR_NAME: &str = ".strata";

/// Translates between virtual (`project://`, `user://`) and real paths.
///
/// Both roots are stored with `/` separators and without a trailing
/// separator. An empty root means the namespace is unbacked: `to_real`
/// strips the marker and `to_virtual` returns paths unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathVirtualizer {
    project_root: String,
    user_root: String,
}

impl PathVirtualizer {
    pub fn new(project_root: impl AsRef<Path>, user_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: normalize_root(&project_root.as_ref().to_string_lossy()),
            user_root: normalize_root(&user_root.as_ref().to_string_lossy()),
        }
    }

    pub fn project_root(&self) -> &str {
        &self.project_root
    }

    pub fn user_root(&self) -> &str {
        &self.user_root
    }

    pub fn set_project_root(&mut self, root: &str) {
        self.project_root = normalize_root(root);
    }

    pub fn set_user_root(&mut self, root: &str) {
        self.user_root = normalize_root(root);
    }

    /// `project://.strata`
    pub fn project_data_path(&self) -> String {
        format!("{PROJECT_PREFIX}{PROJECT_DATA_DIR_NAME}")
    }

    /// `project://.strata/imported`
    pub fn imported_files_path(&self) -> String {
        path_join(&self.project_data_path(), "imported")
    }

    /// Convert a virtual path to a real one.
    ///
    /// Paths outside both namespaces (already real, or foreign `scheme://`
    /// paths) are returned unchanged.
    pub fn to_real(&self, path: &str) -> String {
        if let Some(rest) = path.strip_prefix(PROJECT_PREFIX) {
            return substitute_root(&self.project_root, rest);
        }
        if let Some(rest) = path.strip_prefix(USER_PREFIX) {
            return substitute_root(&self.user_root, rest);
        }
        path.to_string()
    }

    /// Convert a real (absolute or project-relative) path to a `project://`
    /// path.
    ///
    /// Paths that cannot be placed under the project root are returned
    /// unchanged. Paths that do not exist yet are virtualized through their
    /// nearest existing ancestor, one stripped component at a time. Returns
    /// `None` when the walk runs out of ancestors without finding one that
    /// exists.
    pub fn to_virtual(&self, path: &str) -> Option<String> {
        let path = simplify_path(path);

        if self.project_root.is_empty()
            || (is_absolute_path(&path) && !path.starts_with(&self.project_root))
        {
            return Some(path);
        }
        if is_protocol_qualified(&path) {
            return Some(path);
        }

        let root_prefix = with_trailing_separator(&self.canonical_project_root());

        // Components stripped off the end while walking up, innermost first.
        let mut stripped: Vec<&str> = Vec::new();
        let mut current: &str = &path;

        let base = loop {
            if let Some(resolved) = self.resolve_dir(current) {
                let resolved = with_trailing_separator(&resolved);
                if !resolved.starts_with(&root_prefix) {
                    break current.to_string();
                }
                break resolved.replacen(&root_prefix, PROJECT_PREFIX, 1);
            }

            match current.rfind('/') {
                None => break format!("{PROJECT_PREFIX}{current}"),
                Some(0) if current.len() == 1 => {
                    tracing::debug!(path = %path, "filesystem root did not resolve");
                    return None;
                }
                Some(0) => {
                    stripped.push(&current[1..]);
                    current = "/";
                }
                Some(sep) => {
                    stripped.push(&current[sep + 1..]);
                    current = &current[..sep];
                }
            }
        };

        let mut virtual_path = base;
        for component in stripped.iter().rev() {
            if !virtual_path.ends_with('/') {
                virtual_path.push('/');
            }
            virtual_path.push_str(component);
        }
        Some(virtual_path)
    }

    /// Resolve `path` to an absolute directory, the way changing into it
    /// would. Relative paths are taken relative to the project root.
    fn resolve_dir(&self, path: &str) -> Option<String> {
        let candidate = if is_absolute_path(path) {
            PathBuf::from(path)
        } else {
            Path::new(&self.project_root).join(path)
        };
        let resolved = fs::canonicalize(&candidate).ok()?;
        if !resolved.is_dir() {
            return None;
        }
        Some(resolved.to_string_lossy().replace('\\', "/"))
    }

    fn canonical_project_root(&self) -> String {
        match fs::canonicalize(&self.project_root) {
            Ok(resolved) => resolved.to_string_lossy().replace('\\', "/"),
            Err(_) => self.project_root.clone(),
        }
    }
}

fn normalize_root(root: &str) -> String {
    let mut root = root.replace('\\', "/");
    while root.len() > 1 && root.ends_with('/') {
        root.pop();
    }
    root
}

fn substitute_root(root: &str, rest: &str) -> String {
    if root.is_empty() {
        rest.to_string()
    } else if root.ends_with('/') {
        format!("{root}{rest}")
    } else {
        format!("{root}/{rest}")
    }
}

fn with_trailing_separator(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}
