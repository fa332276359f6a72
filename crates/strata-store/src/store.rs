use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use strata_types::{Value, CUSTOM_FEATURES_KEY};

use crate::error::{StoreError, StoreResult};
use crate::features::{FeatureSource, StaticFeatures};
use crate::migrate;
use crate::notify::ChangeNotifier;
use crate::overrides::OverrideIndex;
use crate::usage::{PropertyInfo, PropertyUsage};

/// A stored setting and its metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Setting {
    pub value: Value,
    /// Value restored by a revert; captured by [`PropertyStore::mark_initial`].
    pub initial: Option<Value>,
    /// Insertion order, assigned once.
    pub order: u64,
    pub restart_if_changed: bool,
    pub basic: bool,
    pub internal: bool,
    pub hide_from_editor: bool,
    pub ignore_in_docs: bool,
}

impl Setting {
    fn new(value: Value, order: u64) -> Self {
        Self {
            value,
            initial: None,
            order,
            restart_if_changed: false,
            basic: false,
            internal: false,
            hide_from_editor: false,
            ignore_in_docs: false,
        }
    }
}

/// Point-in-time copy of a setting, as handed to serializers.
#[derive(Clone, Debug, PartialEq)]
pub struct SettingSnapshot {
    pub name: String,
    pub value: Value,
    pub initial: Option<Value>,
    pub order: u64,
    pub hide_from_editor: bool,
}

/// Observer of store mutations.
///
/// Hooks run after the store lock is released, so they may call back into
/// the store. Registries keyed on name prefixes (`autoload/`,
/// `global_group/`) attach here.
pub trait StoreHooks: Send + Sync {
    fn setting_set(&self, _name: &str, _value: &Value) {}
    fn setting_removed(&self, _name: &str) {}
}

enum HookEvent {
    Set(String, Value),
    Removed(String),
}

#[derive(Default)]
struct Inner {
    props: HashMap<String, Setting>,
    overrides: OverrideIndex,
    custom_features: BTreeSet<String>,
    hidden_prefixes: Vec<String>,
    next_order: u64,
}

impl Inner {
    fn setting_mut(&mut self, name: &str) -> StoreResult<&mut Setting> {
        self.props.get_mut(name).ok_or_else(|| StoreError::NotFound {
            name: name.to_string(),
        })
    }

    fn is_hidden(&self, name: &str) -> bool {
        self.hidden_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }
}

/// Thread-safe ordered settings store with feature-override resolution.
///
/// Every operation takes the single store-wide lock for its duration. The
/// lock is never held across I/O or while hooks run.
pub struct PropertyStore {
    inner: Mutex<Inner>,
    features: Arc<dyn FeatureSource>,
    notifier: ChangeNotifier,
    hooks: RwLock<Vec<Arc<dyn StoreHooks>>>,
}

impl PropertyStore {
    /// Create an empty store with no build or platform features.
    pub fn new() -> Self {
        Self::with_features(Arc::new(StaticFeatures::default()))
    }

    pub fn with_features(features: Arc<dyn FeatureSource>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            features,
            notifier: ChangeNotifier::new(),
            hooks: RwLock::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_hooks(&self, hooks: Arc<dyn StoreHooks>) {
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hooks);
    }

    /// The coalesced change flag; drained by the host's scheduler.
    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    // -----------------------------------------------------------------------
    // Values
    // -----------------------------------------------------------------------

    /// Insert, update or (with `Value::Nil`) remove a setting.
    ///
    /// Updates keep the setting's insertion order. Assigning a string to
    /// `_custom_features` adds its comma-separated tags to the custom
    /// feature set instead of storing a value.
    pub fn set(&self, name: &str, value: Value) {
        let event = {
            let mut inner = self.lock();
            if value.is_nil() {
                inner.overrides.remove_target(name);
                inner
                    .props
                    .remove(name)
                    .map(|_| HookEvent::Removed(name.to_string()))
            } else if name == CUSTOM_FEATURES_KEY {
                add_custom_features(&mut inner.custom_features, &value);
                None
            } else {
                inner.overrides.register(name);
                let hook_value = value.clone();
                if let Some(existing) = inner.props.get_mut(name) {
                    existing.value = value;
                } else {
                    let order = inner.next_order;
                    inner.next_order += 1;
                    inner.props.insert(name.to_string(), Setting::new(value, order));
                }
                Some(HookEvent::Set(name.to_string(), hook_value))
            }
        };

        self.notifier.queue();
        if let Some(event) = event {
            self.dispatch(&event);
        }
    }

    /// Remove a setting. Same as assigning `Value::Nil`.
    pub fn remove(&self, name: &str) {
        self.set(name, Value::Nil);
    }

    /// Raw lookup with no feature resolution.
    pub fn get(&self, name: &str) -> StoreResult<Value> {
        let inner = self.lock();
        inner
            .props
            .get(name)
            .map(|s| s.value.clone())
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })
    }

    /// Typed raw lookup.
    pub fn get_as<T>(&self, name: &str) -> StoreResult<T>
    where
        T: for<'a> TryFrom<&'a Value, Error = strata_types::TypeError>,
    {
        let value = self.get(name)?;
        Ok(T::try_from(&value)?)
    }

    pub fn has(&self, name: &str) -> bool {
        self.lock().props.contains_key(name)
    }

    /// Effective value of `name` given the currently active features.
    ///
    /// Override entries are scanned in registration order; the first whose
    /// feature is active and whose target still exists wins. Otherwise the
    /// unqualified value is returned.
    pub fn resolve(&self, name: &str) -> StoreResult<Value> {
        let inner = self.lock();
        let target = inner
            .overrides
            .resolve(
                name,
                |feature| {
                    self.features.has_feature(feature)
                        || inner.custom_features.contains(feature)
                },
                |target| inner.props.contains_key(target),
            )
            .unwrap_or(name);

        match inner.props.get(target) {
            Some(setting) => Ok(setting.value.clone()),
            None => {
                tracing::warn!(name = %target, "setting not found");
                Err(StoreError::NotFound {
                    name: target.to_string(),
                })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().props.is_empty()
    }

    /// Names in insertion order.
    pub fn names(&self) -> Vec<String> {
        let inner = self.lock();
        let mut names: Vec<(&u64, &String)> =
            inner.props.iter().map(|(name, s)| (&s.order, name)).collect();
        names.sort();
        names.into_iter().map(|(_, name)| name.clone()).collect()
    }

    // -----------------------------------------------------------------------
    // Metadata
    // -----------------------------------------------------------------------

    /// Capture `value` as the setting's initial value. Containers are deep
    /// copied, so later edits to the live value leave it untouched.
    pub fn mark_initial(&self, name: &str, value: Value) -> StoreResult<()> {
        self.lock().setting_mut(name)?.initial = Some(value);
        Ok(())
    }

    pub fn initial_value(&self, name: &str) -> StoreResult<Option<Value>> {
        let mut inner = self.lock();
        Ok(inner.setting_mut(name)?.initial.clone())
    }

    /// Returns `true` if the setting has an initial value and differs from it.
    pub fn can_revert(&self, name: &str) -> bool {
        let inner = self.lock();
        match inner.props.get(name) {
            Some(Setting {
                initial: Some(initial),
                value,
                ..
            }) => initial != value,
            _ => false,
        }
    }

    pub fn set_restart_if_changed(&self, name: &str, restart: bool) -> StoreResult<()> {
        self.lock().setting_mut(name)?.restart_if_changed = restart;
        Ok(())
    }

    pub fn set_basic(&self, name: &str, basic: bool) -> StoreResult<()> {
        self.lock().setting_mut(name)?.basic = basic;
        Ok(())
    }

    pub fn set_internal(&self, name: &str, internal: bool) -> StoreResult<()> {
        self.lock().setting_mut(name)?.internal = internal;
        Ok(())
    }

    pub fn set_ignore_in_docs(&self, name: &str, ignore: bool) -> StoreResult<()> {
        self.lock().setting_mut(name)?.ignore_in_docs = ignore;
        Ok(())
    }

    pub fn ignore_in_docs(&self, name: &str) -> StoreResult<bool> {
        Ok(self.lock().setting_mut(name)?.ignore_in_docs)
    }

    pub fn set_hidden_from_editor(&self, name: &str, hidden: bool) -> StoreResult<()> {
        self.lock().setting_mut(name)?.hide_from_editor = hidden;
        Ok(())
    }

    /// Full copy of a setting and its metadata.
    pub fn setting(&self, name: &str) -> StoreResult<Setting> {
        Ok(self.lock().setting_mut(name)?.clone())
    }

    /// Settings starting with `prefix` are listed as storage-only.
    pub fn add_hidden_prefix(&self, prefix: &str) -> StoreResult<()> {
        let mut inner = self.lock();
        if inner.hidden_prefixes.iter().any(|p| p == prefix) {
            return Err(StoreError::AlreadyExists {
                name: prefix.to_string(),
            });
        }
        inner.hidden_prefixes.push(prefix.to_string());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Features
    // -----------------------------------------------------------------------

    /// Returns `true` if `tag` is a build, platform or custom feature.
    pub fn has_feature(&self, tag: &str) -> bool {
        self.features.has_feature(tag) || self.lock().custom_features.contains(tag)
    }

    pub fn add_custom_feature(&self, tag: &str) {
        self.lock().custom_features.insert(tag.to_string());
        self.notifier.queue();
    }

    pub fn custom_features(&self) -> Vec<String> {
        self.lock().custom_features.iter().cloned().collect()
    }

    // -----------------------------------------------------------------------
    // Listings
    // -----------------------------------------------------------------------

    /// Listing sorted by `(order, name)`. Settings hidden from the editor
    /// are omitted.
    pub fn enumerate_ordered(&self) -> Vec<PropertyInfo> {
        let inner = self.lock();
        let mut list: Vec<PropertyInfo> = inner
            .props
            .iter()
            .filter(|(_, s)| !s.hide_from_editor)
            .map(|(name, s)| {
                let mut usage = if s.internal || inner.is_hidden(name) {
                    PropertyUsage::STORAGE
                } else {
                    PropertyUsage::EDITOR | PropertyUsage::STORAGE
                };
                if s.internal {
                    usage |= PropertyUsage::INTERNAL;
                }
                if s.basic {
                    usage |= PropertyUsage::BASIC;
                }
                if s.restart_if_changed {
                    usage |= PropertyUsage::RESTART_IF_CHANGED;
                }
                PropertyInfo {
                    name: name.clone(),
                    value_type: s.value.value_type(),
                    order: s.order,
                    usage,
                }
            })
            .collect();
        list.sort_by(|a, b| (a.order, &a.name).cmp(&(b.order, &b.name)));
        list
    }

    /// Every setting, hidden ones included, sorted by `(order, name)`.
    pub fn entries_ordered(&self) -> Vec<SettingSnapshot> {
        let inner = self.lock();
        let mut list: Vec<SettingSnapshot> = inner
            .props
            .iter()
            .map(|(name, s)| SettingSnapshot {
                name: name.clone(),
                value: s.value.clone(),
                initial: s.initial.clone(),
                order: s.order,
                hide_from_editor: s.hide_from_editor,
            })
            .collect();
        list.sort_by(|a, b| (a.order, &a.name).cmp(&(b.order, &b.name)));
        list
    }

    // -----------------------------------------------------------------------
    // Migration
    // -----------------------------------------------------------------------

    /// Upgrade stored values written at format version `from` (`None` for
    /// pre-versioning data). Returns the number of rewrites.
    pub fn migrate(&self, from: Option<u32>) -> usize {
        let mut changed = 0;
        {
            let mut inner = self.lock();
            for step in migrate::pending_steps(from) {
                for (name, setting) in inner.props.iter_mut() {
                    if step.apply(name, &mut setting.value) {
                        changed += 1;
                    }
                }
                tracing::debug!(target_version = step.target, step = step.description, "migration step applied");
            }
        }
        if changed > 0 {
            self.notifier.queue();
        }
        changed
    }

    fn dispatch(&self, event: &HookEvent) {
        let hooks = self
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for hook in hooks {
            match event {
                HookEvent::Set(name, value) => hook.setting_set(name, value),
                HookEvent::Removed(name) => hook.setting_removed(name),
            }
        }
    }
}

impl Default for PropertyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyStore")
            .field("setting_count", &self.len())
            .finish()
    }
}

fn add_custom_features(set: &mut BTreeSet<String>, value: &Value) {
    let tags: Vec<String> = match value {
        Value::String(list) => list.split(',').map(str::to_string).collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() {
            set.insert(tag.to_string());
        }
    }
}
