//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     RunOptions → load sources → merge → validate prefix
//!         → configure phase → deploy phase → RunReport
//! ```

pub mod startup;

pub use startup::{run, RunError, RunReport};
