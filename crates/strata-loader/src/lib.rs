//! Project setup for Strata.
//!
//! A [`Project`] bundles the settings store with the path virtualizer and
//! the archive manifest. [`ArchiveLoader`] populates it at startup from a
//! resource archive or from a project directory, following
//! [`LoaderConfig`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use strata_loader::{ArchiveLoader, LoaderConfig, Project};
//! use strata_store::StaticFeatures;
//!
//! let config = LoaderConfig {
//!     project_dir: "/games/demo".into(),
//!     ..Default::default()
//! };
//! let mut project = Project::from_config(&config, Arc::new(StaticFeatures::new(["pc"])));
//! let report = ArchiveLoader::new(config).load(&mut project)?;
//! println!("loaded {} settings", report.settings_loaded);
//! # Ok::<(), strata_loader::LoadError>(())
//! ```

pub mod candidates;
pub mod config;
pub mod error;
pub mod hooks;
pub mod loader;
pub mod project;

pub use candidates::{archive_candidates, Candidate, CandidateKind};
pub use config::LoaderConfig;
pub use error::{LoadError, LoadResult};
pub use hooks::{MountHooks, NoOpHooks};
pub use loader::{
    ArchiveLoader, LoadReport, LoadState, Probe, ProbeOutcome, ReadySource, SETTINGS_BINARY,
    SETTINGS_TEXT,
};
pub use project::{Project, FEATURES_SETTING, SETTINGS_OVERRIDE_SETTING};
