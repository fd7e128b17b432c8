//! Declarative source subsystem.
//!
//! # Data Flow
//! ```text
//! YAML file or folder of YAML files
//!     → loader.rs (read, parse, skip broken files in folders)
//!     → schema.rs (apply defaults, check required fields)
//!     → loader::merge_sources (concatenate packages, resolve prefix)
//!     → filter.rs (package/artifact selection)
//! ```
//!
//! # Design Decisions
//! - Defaults are applied once, after parsing, by a pure function
//! - Merging is plain concatenation; duplicate ids are kept
//! - Filters match declared ids, never prefixed ones

pub mod filter;
pub mod loader;
pub mod schema;

pub use filter::{NameFilter, Selection};
pub use loader::{load_sources, merge_sources, LoadError, SourceFile};
pub use schema::{
    apply_prefix, should_deploy, Artifact, ArtifactType, BatchSettings, Configuration, Package,
    Parameter,
};
