//! Virtual path translation for Strata.
//!
//! Two virtual namespaces sit on top of the real filesystem:
//!
//! - `project://`: backed by the project root
//! - `user://`: backed by the user-data root
//!
//! Markers are always spelled with `://`: a file at `<root>/new/file.txt`
//! is `project://new/file.txt`, never `project:new/file.txt`.
//!
//! [`PathVirtualizer`] converts in both directions. Going from real to
//! virtual probes the filesystem, so paths to files that do not exist yet
//! are virtualized by walking up to the nearest existing parent.
//!
//! # Modules
//!
//! - [`simplify`]: lexical normalization (`.`/`..`, separators, scheme prefixes)
//! - [`virtualizer`]: the [`PathVirtualizer`] itself

pub mod simplify;
pub mod virtualizer;

pub use simplify::{is_absolute_path, is_protocol_qualified, path_join, simplify_path};
pub use virtualizer::{PathVirtualizer, PROJECT_DATA_DIR_NAME, PROJECT_PREFIX, USER_PREFIX};
