//! Run orchestration.
//!
//! # Responsibilities
//! - Load and merge declarative sources
//! - Validate the effective deployment prefix
//! - Run the configure phase, then the deploy phase
//!
//! # Design Decisions
//! - Fail fast before phase 1: any load or validation error is fatal
//! - After that, failures are counted per unit and never abort the run
//! - Phase 2 starts only after phase 1 completed

use std::sync::Arc;

use thiserror::Error;

use crate::config::{validate_prefix, RunOptions, ValidationError};
use crate::configure::{ConfigurePhase, Mode};
use crate::deploy::{DeployPolicy, DeploymentResult, DeploymentScheduler};
use crate::manifest::{load_sources, merge_sources, LoadError, Selection};
use crate::remote::RemoteApi;
use crate::stats::RunStats;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid options: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("invalid effective deployment prefix: {0}")]
    Prefix(#[source] ValidationError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("a remote client is required unless running in preview mode")]
    NoRemote,
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Everything a finished run reports.
#[derive(Debug)]
pub struct RunReport {
    pub stats: RunStats,
    pub dry_run: bool,
    pub deployments: Vec<DeploymentResult>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        !self.stats.has_failures()
    }
}

/// Execute one configure-and-deploy run.
///
/// `remote` may be `None` only in preview mode.
pub async fn run(
    options: &RunOptions,
    remote: Option<Arc<dyn RemoteApi>>,
) -> Result<RunReport, RunError> {
    if let Some(prefix) = &options.deployment_prefix {
        validate_prefix(prefix).map_err(|e| RunError::Validation(vec![e]))?;
    }
    if !options.dry_run && remote.is_none() {
        return Err(RunError::NoRemote);
    }

    if options.dry_run {
        tracing::info!("Running in preview mode, no changes will be made");
    }

    let sources = load_sources(&options.config_path)?;
    let config = merge_sources(&sources, options.deployment_prefix.as_deref());
    validate_prefix(&config.deployment_prefix).map_err(RunError::Prefix)?;

    if !config.deployment_prefix.is_empty() {
        tracing::info!(prefix = %config.deployment_prefix, "Using deployment prefix");
    }

    let selection = Selection::new(
        options.package_filter.as_deref(),
        options.artifact_filter.as_deref(),
    );
    let mode = match (&remote, options.dry_run) {
        (Some(remote), false) => Mode::Apply(remote.as_ref()),
        _ => Mode::Preview,
    };

    let mut stats = RunStats::default();
    let phase = ConfigurePhase {
        mode,
        selection: &selection,
        batch_size: options.batch_size,
        disable_batch: options.disable_batch,
    };
    let tasks = phase.run(&config, &mut stats).await;

    let mut deployments = Vec::new();
    match remote {
        Some(remote) if !options.dry_run && !tasks.is_empty() => {
            let policy = DeployPolicy {
                max_retries: options.deploy_retries,
                delay: options.deploy_delay,
            };
            let scheduler = DeploymentScheduler::new(remote, policy, options.parallel_deployments);
            deployments = scheduler.run(tasks, &mut stats).await;
        }
        _ if !tasks.is_empty() => {
            tracing::info!(tasks = tasks.len(), "Preview mode, skipping deployment");
        }
        _ => tracing::info!("No artifacts queued for deployment"),
    }

    Ok(RunReport {
        stats,
        dry_run: options.dry_run,
        deployments,
    })
}
