//! Forward migration of settings written by older format versions.
//!
//! Each [`MigrationStep`] upgrades values to the shape of its target version.
//! Steps run in ascending order, starting with the first one newer than the
//! stored version. A step only touches values matching its namespace and
//! shape; everything else passes through untouched. Nothing here fails.

use std::collections::BTreeMap;

use strata_types::Value;

/// Format version written by this build.
pub const CURRENT_FORMAT_VERSION: u32 = 5;

/// Namespace of input action settings.
pub const INPUT_PREFIX: &str = "input/";

/// Deadzone given to actions upgraded from the bare-list shape.
pub const DEFAULT_DEADZONE: f64 = 0.5;

/// Device id older versions used for emulated events.
pub const DEVICE_EMULATED: i64 = -1;
/// Device id meaning "any device".
pub const DEVICE_ALL: i64 = -3;

/// One version-specific structural rewrite.
pub struct MigrationStep {
    /// Version whose shape this step produces.
    pub target: u32,
    pub description: &'static str,
    rewrite: fn(&str, &mut Value) -> bool,
}

impl MigrationStep {
    /// Rewrite `value` in place. Returns `true` if it changed.
    pub fn apply(&self, name: &str, value: &mut Value) -> bool {
        (self.rewrite)(name, value)
    }
}

impl std::fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationStep")
            .field("target", &self.target)
            .field("description", &self.description)
            .finish()
    }
}

const STEPS: &[MigrationStep] = &[
    MigrationStep {
        target: 4,
        description: "wrap bare input event lists into action records",
        rewrite: wrap_input_action,
    },
    MigrationStep {
        target: 5,
        description: "map emulated-device input events to all devices",
        rewrite: widen_emulated_device,
    },
];

/// Steps that apply to data stored at `from` (`None` = pre-versioning).
pub fn pending_steps(from: Option<u32>) -> impl Iterator<Item = &'static MigrationStep> {
    let from = from.unwrap_or(0);
    STEPS.iter().filter(move |step| step.target > from)
}

/// Migrate a loaded document's entries. Returns the number of rewrites.
pub fn migrate_entries(from: Option<u32>, entries: &mut [(String, Value)]) -> usize {
    let mut changed = 0;
    for step in pending_steps(from) {
        for (name, value) in entries.iter_mut() {
            if step.apply(name, value) {
                changed += 1;
            }
        }
    }
    changed
}

fn wrap_input_action(name: &str, value: &mut Value) -> bool {
    if !name.starts_with(INPUT_PREFIX) {
        return false;
    }
    let Value::Array(events) = value else {
        return false;
    };
    let events = std::mem::take(events);
    let mut action = BTreeMap::new();
    action.insert("deadzone".to_string(), Value::Float(DEFAULT_DEADZONE));
    action.insert("events".to_string(), Value::Array(events));
    *value = Value::Dictionary(action);
    true
}

fn widen_emulated_device(name: &str, value: &mut Value) -> bool {
    if !name.starts_with(INPUT_PREFIX) {
        return false;
    }
    let Some(Value::Array(events)) = value
        .as_dictionary_mut()
        .and_then(|action| action.get_mut("events"))
    else {
        return false;
    };
    let mut changed = false;
    for event in events.iter_mut() {
        if let Some(device) = event.as_dictionary_mut().and_then(|e| e.get_mut("device")) {
            if *device == Value::Int(DEVICE_EMULATED) {
                *device = Value::Int(DEVICE_ALL);
                changed = true;
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_event(device: i64) -> Value {
        let mut event = BTreeMap::new();
        event.insert("type".to_string(), Value::from("key"));
        event.insert("device".to_string(), Value::Int(device));
        Value::Dictionary(event)
    }

    #[test]
    fn pre_versioning_runs_every_step() {
        let targets: Vec<u32> = pending_steps(None).map(|s| s.target).collect();
        assert_eq!(targets, vec![4, 5]);
    }

    #[test]
    fn current_version_runs_nothing() {
        assert_eq!(pending_steps(Some(CURRENT_FORMAT_VERSION)).count(), 0);
    }

    #[test]
    fn version_four_runs_only_device_step() {
        let targets: Vec<u32> = pending_steps(Some(4)).map(|s| s.target).collect();
        assert_eq!(targets, vec![5]);
    }

    #[test]
    fn bare_event_list_becomes_action_record() {
        let events = vec![key_event(0), key_event(2)];
        let mut entries = vec![("input/jump".to_string(), Value::Array(events.clone()))];
        migrate_entries(Some(3), &mut entries);

        let action = entries[0].1.as_dictionary().unwrap();
        assert_eq!(action["deadzone"], Value::Float(0.5));
        assert_eq!(action["events"], Value::Array(events));
    }

    #[test]
    fn settings_outside_input_are_untouched() {
        let list = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        let mut entries = vec![
            ("display/sizes".to_string(), list.clone()),
            ("inputs/jump".to_string(), list.clone()),
        ];
        assert_eq!(migrate_entries(None, &mut entries), 0);
        assert_eq!(entries[0].1, list);
        assert_eq!(entries[1].1, list);
    }

    #[test]
    fn already_migrated_actions_are_left_alone_by_wrap() {
        let mut action = BTreeMap::new();
        action.insert("deadzone".to_string(), Value::Float(0.2));
        action.insert("events".to_string(), Value::Array(vec![]));
        let original = Value::Dictionary(action);
        let mut entries = vec![("input/fire".to_string(), original.clone())];
        migrate_entries(Some(3), &mut entries);
        assert_eq!(entries[0].1, original);
    }

    #[test]
    fn unversioned_list_gets_both_steps() {
        let mut entries = vec![(
            "input/left".to_string(),
            Value::Array(vec![key_event(-1), key_event(1)]),
        )];
        migrate_entries(None, &mut entries);
        let action = entries[0].1.as_dictionary().unwrap();
        let events = action["events"].as_array().unwrap();
        assert_eq!(events[0], key_event(DEVICE_ALL));
        assert_eq!(events[1], key_event(1));
    }

    #[test]
    fn malformed_action_is_skipped() {
        let mut action = BTreeMap::new();
        action.insert("events".to_string(), Value::from("not a list"));
        let original = Value::Dictionary(action);
        let mut entries = vec![("input/odd".to_string(), original.clone())];
        assert_eq!(migrate_entries(Some(4), &mut entries), 0);
        assert_eq!(entries[0].1, original);
    }
}
