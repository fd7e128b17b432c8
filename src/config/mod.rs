//! Settings subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → options.rs (layer CLI flags over file values and defaults)
//!     → validation.rs (semantic checks)
//!     → RunOptions (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Settings are read once per run
//! - All fields have defaults to allow minimal files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod options;
pub mod schema;
pub mod validation;

pub use loader::{load_settings, SettingsError};
pub use options::RunOptions;
pub use schema::{ConfigureConfig, ObservabilityConfig, ServiceConfig, Settings};
pub use validation::{validate_options, validate_prefix, ValidationError};
