//! Active-feature sources and build compatibility checks.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Features whose names begin with this prefix predate a rename and are
/// treated as satisfied by every build.
pub const LEGACY_FEATURE_PREFIX: &str = "Vulkan";

/// Read-only oracle for build-time and platform feature tags.
///
/// The store consults it on every resolution; custom features held by the
/// store itself are checked separately.
pub trait FeatureSource: Send + Sync {
    fn has_feature(&self, tag: &str) -> bool;
}

/// A fixed set of feature tags supplied by the host at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticFeatures {
    tags: BTreeSet<String>,
}

impl StaticFeatures {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn insert(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

impl FeatureSource for StaticFeatures {
    fn has_feature(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Facts about the running build, used to check a project's declared
/// features against what this build can honor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildFeatures {
    /// Major.minor branch, e.g. `"1.2"`. Always required.
    pub version_branch: String,
    pub version_patch: u32,
    /// Branch, patch and status, e.g. `"1.2.3.stable"`.
    pub full_config: String,
    /// `full_config` plus the build name.
    pub full_build: String,
    /// Builds using 64-bit reals require projects to opt in.
    pub double_precision: bool,
    /// Optional capabilities compiled into this build.
    pub extra: Vec<String>,
}

impl Default for BuildFeatures {
    fn default() -> Self {
        Self {
            version_branch: "1.0".into(),
            version_patch: 0,
            full_config: "1.0.0.stable".into(),
            full_build: "1.0.0.stable.custom_build".into(),
            double_precision: false,
            extra: vec!["Forward Plus".into(), "Mobile".into(), "GL Compatibility".into()],
        }
    }
}

impl BuildFeatures {
    /// Features every project opened with this build must declare.
    pub fn required(&self) -> Vec<String> {
        let mut features = vec![self.version_branch.clone()];
        if self.double_precision {
            features.push("Double Precision".into());
        }
        features
    }

    /// Features this build supports, including the required ones.
    ///
    /// Patch and full version strings are only used when a project pins them
    /// explicitly.
    pub fn supported(&self) -> Vec<String> {
        let mut features = self.required();
        features.extend(self.extra.iter().cloned());
        features.push(format!("{}.{}", self.version_branch, self.version_patch));
        features.push(self.full_config.clone());
        features.push(self.full_build.clone());
        features
    }

    /// Project features this build lacks, sorted.
    pub fn unsupported(&self, project_features: &[String]) -> Vec<String> {
        let supported = self.supported();
        let mut missing: Vec<String> = project_features
            .iter()
            .filter(|f| !supported.contains(f))
            .filter(|f| !f.starts_with(LEGACY_FEATURE_PREFIX))
            .cloned()
            .collect();
        missing.sort();
        missing
    }

    /// Intersect a project's features with the supported set and add any
    /// missing required ones, sorted.
    pub fn trim_to_supported(&self, project_features: &[String]) -> Vec<String> {
        let supported = self.supported();
        let mut features: Vec<String> = project_features
            .iter()
            .filter(|f| supported.contains(f))
            .cloned()
            .collect();
        for required in self.required() {
            if !features.contains(&required) {
                features.push(required);
            }
        }
        features.sort();
        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn static_features_lookup() {
        let features = StaticFeatures::new(["linux", "pc"]);
        assert!(features.has_feature("linux"));
        assert!(!features.has_feature("Linux"));
        assert!(!features.has_feature("web"));
    }

    #[test]
    fn required_includes_branch() {
        let build = BuildFeatures::default();
        assert_eq!(build.required(), strings(&["1.0"]));
    }

    #[test]
    fn double_precision_is_required_when_enabled() {
        let build = BuildFeatures {
            double_precision: true,
            ..Default::default()
        };
        assert!(build.required().contains(&"Double Precision".to_string()));
    }

    #[test]
    fn supported_includes_pinning_strings() {
        let build = BuildFeatures::default();
        let supported = build.supported();
        assert!(supported.contains(&"1.0.0".to_string()));
        assert!(supported.contains(&"1.0.0.stable".to_string()));
        assert!(supported.contains(&"Mobile".to_string()));
    }

    #[test]
    fn unsupported_is_sorted() {
        let build = BuildFeatures::default();
        let project = strings(&["1.0", "Zeta", "C#", "Mobile"]);
        assert_eq!(build.unsupported(&project), strings(&["C#", "Zeta"]));
    }

    #[test]
    fn legacy_prefixed_features_are_ignored() {
        let build = BuildFeatures::default();
        let project = strings(&["1.0", "Vulkan Clustered", "Vulkan Mobile"]);
        assert!(build.unsupported(&project).is_empty());
    }

    #[test]
    fn trim_drops_unsupported_and_adds_required() {
        let build = BuildFeatures::default();
        let project = strings(&["Mobile", "C#"]);
        assert_eq!(build.trim_to_supported(&project), strings(&["1.0", "Mobile"]));
    }
}
