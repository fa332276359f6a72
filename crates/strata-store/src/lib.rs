//! Settings store for Strata.
//!
//! [`PropertyStore`] is the authoritative, thread-safe map from setting name
//! to [`Value`](strata_types::Value). Alongside the raw map it maintains a
//! feature [`OverrideIndex`]: storing `display/width.mobile` registers an
//! override of `display/width` that [`PropertyStore::resolve`] selects
//! whenever the `mobile` feature is active.
//!
//! # Design Rules
//!
//! 1. Every setting receives an insertion order once; orders are never reused.
//! 2. Assigning `Value::Nil` removes a setting.
//! 3. One store-wide lock guards all state. No I/O happens under it, and
//!    observer hooks run after it is released.
//! 4. Mutations coalesce into a single pending change notification.
//! 5. Migration rewrites values in place and never fails.

pub mod error;
pub mod features;
pub mod migrate;
pub mod notify;
pub mod overrides;
pub mod store;
pub mod usage;

pub use error::{StoreError, StoreResult};
pub use features::{BuildFeatures, FeatureSource, StaticFeatures, LEGACY_FEATURE_PREFIX};
pub use migrate::{MigrationStep, CURRENT_FORMAT_VERSION};
pub use notify::{ChangeNotifier, ChangeSink};
pub use overrides::OverrideIndex;
pub use store::{PropertyStore, Setting, SettingSnapshot, StoreHooks};
pub use usage::{PropertyInfo, PropertyUsage};
