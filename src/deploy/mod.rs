//! Deployment subsystem (phase 2).
//!
//! # Data Flow
//! ```text
//! Vec<DeploymentTask> from the configure phase
//!     → scheduler.rs (group by package, per-package semaphore)
//!     → machine.rs (trigger, poll, fetch error detail) per task
//!     → status.rs (raw runtime status → DeployStatus)
//!     → results channel → single collector → RunStats
//! ```
//!
//! # Design Decisions
//! - One tokio task per deployment; a failure never cancels siblings
//! - No global cancellation; retries bound the lifetime of every unit
//! - Stats are aggregated after fan-in, never from inside workers

pub mod machine;
pub mod scheduler;
pub mod status;
pub mod task;

pub use machine::{deploy_artifact, DeployError, DeployOutcome, DeployPolicy};
pub use scheduler::{DeploymentResult, DeploymentScheduler};
pub use status::DeployStatus;
pub use task::DeploymentTask;
