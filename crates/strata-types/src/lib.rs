//! Foundation types for Strata.
//!
//! Every other Strata crate depends on `strata-types`. It defines the
//! dynamically-typed [`Value`] stored under each setting and the helpers that
//! split a setting name into its base and feature qualifiers.
//!
//! # Key Types
//!
//! - [`Value`]: closed tagged union over the supported scalar and container kinds
//! - [`ValueType`]: discriminant of a [`Value`], used in listings and errors
//! - [`SettingName`]: borrowed view of a `base.feature1.feature2` name

pub mod error;
pub mod name;
pub mod value;

pub use error::TypeError;
pub use name::{SettingName, CUSTOM_FEATURES_KEY};
pub use value::{Value, ValueType};
