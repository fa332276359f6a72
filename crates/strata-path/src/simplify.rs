//! Lexical path normalization.
//!
//! Nothing here touches the filesystem. Paths are handled as `/`-separated
//! strings; backslashes are converted on entry.

/// Returns `true` if `path` starts with a `scheme://` prefix whose scheme is
/// made solely of ASCII alphanumerics.
pub fn is_protocol_qualified(path: &str) -> bool {
    match path.find("://") {
        Some(p) if p > 0 => path[..p].chars().all(|c| c.is_ascii_alphanumeric()),
        _ => false,
    }
}

/// Returns `true` for rooted paths, drive-letter paths and scheme paths.
pub fn is_absolute_path(path: &str) -> bool {
    match path.len() {
        0 => false,
        1 => path.starts_with('/') || path.starts_with('\\'),
        _ => {
            path.starts_with('/')
                || path.starts_with('\\')
                || path.contains(":/")
                || path.contains(":\\")
        }
    }
}

/// Normalize a path: convert `\` to `/`, collapse repeated separators, drop
/// `.` segments and fold `..` into its parent.
///
/// A scheme prefix (`project://`), a leading `/` or a drive prefix (`C:/`)
/// is preserved verbatim. Leading `..` segments that have nothing to fold
/// into are kept.
pub fn simplify_path(path: &str) -> String {
    let path = path.replace('\\', "/");

    let (prefix, rest) = split_prefix(&path);

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let mut out = String::with_capacity(path.len());
    out.push_str(prefix);
    out.push_str(&segments.join("/"));
    out
}

/// Join two path fragments with exactly one separator between them.
pub fn path_join(base: &str, file: &str) -> String {
    if base.is_empty() {
        return file.to_string();
    }
    if base.ends_with('/') || file.starts_with('/') {
        format!("{base}{file}")
    } else {
        format!("{base}/{file}")
    }
}

fn split_prefix(path: &str) -> (&str, &str) {
    if is_protocol_qualified(path) {
        if let Some(p) = path.find("://") {
            return path.split_at(p + 3);
        }
    }
    if path.starts_with('/') {
        return path.split_at(1);
    }
    if let Some(p) = path.find(":/") {
        let first_sep = path.find('/').unwrap_or(path.len());
        if p < first_sep {
            return path.split_at(p + 2);
        }
    }
    ("", path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn drops_current_dir_segments() {
        assert_eq!(simplify_path("a/./b/."), "a/b");
        assert_eq!(simplify_path("/a/./b"), "/a/b");
    }

    #[test]
    fn folds_parent_segments() {
        assert_eq!(simplify_path("/a/b/../c"), "/a/c");
        assert_eq!(simplify_path("a/b/../../c"), "c");
    }

    #[test]
    fn keeps_leading_parent_segments() {
        assert_eq!(simplify_path("../a"), "../a");
        assert_eq!(simplify_path("../../a/.."), "../..");
    }

    #[test]
    fn collapses_separators_and_backslashes() {
        assert_eq!(simplify_path("/a//b///c/"), "/a/b/c");
        assert_eq!(simplify_path("a\\b\\c"), "a/b/c");
    }

    #[test]
    fn preserves_scheme_prefix() {
        assert_eq!(simplify_path("project://a/../b"), "project://b");
        assert_eq!(simplify_path("user://"), "user://");
    }

    #[test]
    fn preserves_drive_prefix() {
        assert_eq!(simplify_path("C:/games//x/../y"), "C:/games/y");
        assert_eq!(simplify_path("C:\\games\\y"), "C:/games/y");
    }

    #[test]
    fn protocol_detection() {
        assert!(is_protocol_qualified("project://x"));
        assert!(is_protocol_qualified("http2://host"));
        assert!(!is_protocol_qualified("://x"));
        assert!(!is_protocol_qualified("my-scheme://x"));
        assert!(!is_protocol_qualified("/abs/path"));
    }

    #[test]
    fn absolute_detection() {
        assert!(is_absolute_path("/"));
        assert!(is_absolute_path("/a"));
        assert!(is_absolute_path("C:/a"));
        assert!(is_absolute_path("project://a"));
        assert!(!is_absolute_path(""));
        assert!(!is_absolute_path("a/b"));
    }

    #[test]
    fn join_inserts_one_separator() {
        assert_eq!(path_join("a", "b"), "a/b");
        assert_eq!(path_join("a/", "b"), "a/b");
        assert_eq!(path_join("project://", "b"), "project://b");
        assert_eq!(path_join("", "b"), "b");
    }

    proptest! {
        #[test]
        fn simplify_is_idempotent(path in "(/)?([a-z]{1,3}|\\.|\\.\\.)(/([a-z]{1,3}|\\.|\\.\\.)){0,6}/?") {
            let once = simplify_path(&path);
            prop_assert_eq!(simplify_path(&once), once.clone());
        }

        #[test]
        fn simplified_has_no_dot_segments(path in "/([a-z]{1,3}|\\.)(/([a-z]{1,3}|\\.)){0,6}") {
            let simplified = simplify_path(&path);
            prop_assert!(!simplified.split('/').any(|s| s == "."));
            prop_assert!(!simplified.contains("//"));
        }
    }
}
