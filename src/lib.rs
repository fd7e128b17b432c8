//! Declarative configure-and-deploy engine for integration artifacts.

pub mod cli;
pub mod config;
pub mod configure;
pub mod deploy;
pub mod lifecycle;
pub mod manifest;
pub mod observability;
pub mod remote;
pub mod stats;

pub use config::RunOptions;
pub use lifecycle::{run, RunError, RunReport};
pub use remote::RemoteApi;
pub use stats::RunStats;
