//! Configuration subsystem (phase 1).
//!
//! # Data Flow
//! ```text
//! merged Configuration
//!     → phase.rs (filter → prefix → per-artifact update, sequential)
//!     → parameters.rs (batch with verification, or individual requests)
//!     → Vec<DeploymentTask> for the deploy phase
//! ```

pub mod parameters;
pub mod phase;

pub use parameters::{choose_strategy, ParameterError, ParameterUpdater, UpdateReport, UpdateStrategy};
pub use phase::{ConfigurePhase, Mode};
