use serde::{Deserialize, Serialize};
use strata_types::Value;

/// Decoded contents of one settings file.
///
/// Entries keep file order; loading a document inserts them into the store
/// in that order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsDocument {
    /// Format version the file declares. `None` for files that predate
    /// versioning.
    pub version: Option<u32>,
    pub entries: Vec<(String, Value)>,
}

impl SettingsDocument {
    pub fn new(version: Option<u32>) -> Self {
        Self {
            version,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }

    /// Last value recorded for `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
