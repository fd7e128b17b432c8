//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::ConfigureConfig;

#[derive(Debug, Parser)]
#[command(name = "artifact-configure")]
#[command(about = "Configure and deploy integration artifacts from YAML sources", long_about = None)]
pub struct Cli {
    /// YAML file or folder of YAML files to apply
    #[arg(short = 'c', long)]
    pub config_path: Option<String>,

    /// Prefix prepended to every package and artifact id
    #[arg(short = 'p', long)]
    pub deployment_prefix: Option<String>,

    /// Comma-separated package ids to include
    #[arg(long)]
    pub package_filter: Option<String>,

    /// Comma-separated artifact ids to include
    #[arg(long)]
    pub artifact_filter: Option<String>,

    /// Show what would change without touching the tenant
    #[arg(long)]
    pub dry_run: bool,

    /// Status checks per deployment [default: 5]
    #[arg(long)]
    pub deploy_retries: Option<u32>,

    /// Seconds between status checks [default: 15]
    #[arg(long)]
    pub deploy_delay: Option<u64>,

    /// Concurrent deployments per package [default: 3]
    #[arg(long)]
    pub parallel_deployments: Option<usize>,

    /// Operations per batch request [default: 90]
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Send every parameter as its own request
    #[arg(long)]
    pub disable_batch: bool,

    /// TOML settings file with tenant connection and defaults
    #[arg(long)]
    pub settings: Option<PathBuf>,
}

impl Cli {
    /// Command-line values in settings shape. Absent flags stay `None` so
    /// the settings file can supply them.
    pub fn overrides(&self) -> ConfigureConfig {
        ConfigureConfig {
            config_path: self.config_path.clone(),
            deployment_prefix: self.deployment_prefix.clone(),
            package_filter: self.package_filter.clone(),
            artifact_filter: self.artifact_filter.clone(),
            dry_run: self.dry_run.then_some(true),
            deploy_retries: self.deploy_retries,
            deploy_delay_secs: self.deploy_delay,
            parallel_deployments: self.parallel_deployments,
            batch_size: self.batch_size,
            disable_batch: self.disable_batch.then_some(true),
        }
    }
}
