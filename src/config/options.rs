//! Effective run options.
//!
//! Each control resolves as: command line, then settings file, then the
//! built-in default. Zero numeric values count as unset.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::schema::{
    ConfigureConfig, DEFAULT_BATCH_SIZE, DEFAULT_DEPLOY_DELAY_SECS, DEFAULT_DEPLOY_RETRIES,
    DEFAULT_PARALLEL_DEPLOYMENTS,
};

/// Fully resolved controls for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub config_path: PathBuf,
    pub deployment_prefix: Option<String>,
    pub package_filter: Option<String>,
    pub artifact_filter: Option<String>,
    pub dry_run: bool,
    pub deploy_retries: u32,
    pub deploy_delay: Duration,
    pub parallel_deployments: usize,
    pub batch_size: usize,
    pub disable_batch: bool,
}

impl RunOptions {
    /// Layer command-line values over settings-file values.
    pub fn resolve(cli: &ConfigureConfig, file: &ConfigureConfig) -> Self {
        let text = |a: &Option<String>, b: &Option<String>| {
            a.clone().or_else(|| b.clone()).filter(|s| !s.is_empty())
        };

        Self {
            config_path: PathBuf::from(text(&cli.config_path, &file.config_path).unwrap_or_default()),
            deployment_prefix: text(&cli.deployment_prefix, &file.deployment_prefix),
            package_filter: text(&cli.package_filter, &file.package_filter),
            artifact_filter: text(&cli.artifact_filter, &file.artifact_filter),
            dry_run: cli.dry_run.or(file.dry_run).unwrap_or(false),
            deploy_retries: non_zero(cli.deploy_retries, file.deploy_retries)
                .unwrap_or(DEFAULT_DEPLOY_RETRIES),
            deploy_delay: Duration::from_secs(
                non_zero(cli.deploy_delay_secs, file.deploy_delay_secs)
                    .unwrap_or(DEFAULT_DEPLOY_DELAY_SECS),
            ),
            parallel_deployments: non_zero(cli.parallel_deployments, file.parallel_deployments)
                .unwrap_or(DEFAULT_PARALLEL_DEPLOYMENTS),
            batch_size: non_zero(cli.batch_size, file.batch_size).unwrap_or(DEFAULT_BATCH_SIZE),
            disable_batch: cli.disable_batch.or(file.disable_batch).unwrap_or(false),
        }
    }
}

fn non_zero<T: Default + PartialEq>(cli: Option<T>, file: Option<T>) -> Option<T> {
    let zero = T::default();
    cli.filter(|v| *v != zero).or_else(|| file.filter(|v| *v != zero))
}
