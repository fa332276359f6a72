//! Feature override index.
//!
//! Maps a base setting name to the qualified names that override it, in the
//! order they were registered. The index never owns values; resolution asks
//! the caller whether a target still exists, so stale entries are skipped.

use std::collections::HashMap;

use strata_types::SettingName;

/// One `(feature, qualified_name)` pair registered under a base name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverrideEntry {
    pub feature: String,
    pub target: String,
}

#[derive(Clone, Debug, Default)]
pub struct OverrideIndex {
    entries: HashMap<String, Vec<OverrideEntry>>,
}

impl OverrideIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every qualifier of `name` under its base name.
    ///
    /// Undotted names are ignored. A pair already present is not appended a
    /// second time, which leaves the scan order unchanged.
    pub fn register(&mut self, name: &str) {
        let parsed = SettingName::parse(name);
        if !parsed.is_qualified() {
            return;
        }
        let list = self.entries.entry(parsed.base().to_string()).or_default();
        for feature in parsed.qualifiers() {
            let exists = list
                .iter()
                .any(|e| e.feature == feature && e.target == name);
            if !exists {
                list.push(OverrideEntry {
                    feature: feature.to_string(),
                    target: name.to_string(),
                });
            }
        }
    }

    /// Drop the entries whose target is `name`.
    pub fn remove_target(&mut self, name: &str) {
        let parsed = SettingName::parse(name);
        if !parsed.is_qualified() {
            return;
        }
        if let Some(list) = self.entries.get_mut(parsed.base()) {
            list.retain(|e| e.target != name);
            if list.is_empty() {
                self.entries.remove(parsed.base());
            }
        }
    }

    /// Entries registered under `base`, in scan order.
    pub fn entries(&self, base: &str) -> &[OverrideEntry] {
        self.entries.get(base).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The first target whose feature is active and which still exists.
    pub fn resolve<'a>(
        &'a self,
        base: &str,
        is_active: impl Fn(&str) -> bool,
        exists: impl Fn(&str) -> bool,
    ) -> Option<&'a str> {
        self.entries(base)
            .iter()
            .find(|e| is_active(&e.feature) && exists(&e.target))
            .map(|e| e.target.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undotted_names_register_nothing() {
        let mut idx = OverrideIndex::new();
        idx.register("plain");
        assert!(idx.entries("plain").is_empty());
    }

    #[test]
    fn each_qualifier_registers_under_base() {
        let mut idx = OverrideIndex::new();
        idx.register("setting.mobile.debug");
        let entries = idx.entries("setting");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].feature, "mobile");
        assert_eq!(entries[1].feature, "debug");
        assert!(entries.iter().all(|e| e.target == "setting.mobile.debug"));
    }

    #[test]
    fn registration_order_is_call_order() {
        let mut idx = OverrideIndex::new();
        idx.register("a.f2");
        idx.register("a.f1");
        let features: Vec<_> = idx.entries("a").iter().map(|e| e.feature.as_str()).collect();
        assert_eq!(features, vec!["f2", "f1"]);
    }

    #[test]
    fn re_registration_does_not_duplicate() {
        let mut idx = OverrideIndex::new();
        idx.register("a.f1");
        idx.register("a.f2");
        idx.register("a.f1");
        assert_eq!(idx.entries("a").len(), 2);
        assert_eq!(idx.entries("a")[0].target, "a.f1");
    }

    #[test]
    fn resolve_skips_inactive_and_missing() {
        let mut idx = OverrideIndex::new();
        idx.register("a.f1");
        idx.register("a.f2");
        idx.register("a.f3");
        let active = |f: &str| f == "f2" || f == "f3";
        assert_eq!(idx.resolve("a", active, |_| true), Some("a.f2"));
        assert_eq!(idx.resolve("a", active, |t| t != "a.f2"), Some("a.f3"));
        assert_eq!(idx.resolve("a", |_| false, |_| true), None);
    }

    #[test]
    fn remove_target_compacts() {
        let mut idx = OverrideIndex::new();
        idx.register("a.f1");
        idx.register("a.f2");
        idx.remove_target("a.f1");
        assert_eq!(idx.entries("a").len(), 1);
        idx.remove_target("a.f2");
        assert!(idx.entries("a").is_empty());
    }

    #[test]
    fn feature_match_is_case_sensitive() {
        let mut idx = OverrideIndex::new();
        idx.register("a.Mobile");
        assert_eq!(idx.resolve("a", |f| f == "mobile", |_| true), None);
        assert_eq!(idx.resolve("a", |f| f == "Mobile", |_| true), Some("a.Mobile"));
    }
}
