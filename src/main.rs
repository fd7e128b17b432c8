//! artifact-configure
//!
//! Applies declarative YAML configuration to integration artifacts on a
//! remote tenant, then deploys the ones that ask for it.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI flags ──┐
//!               ├─▶ RunOptions ─▶ manifest (load, merge, filter, prefix)
//!   settings ───┘                     │
//!                                     ▼
//!                          configure phase (sequential)
//!                          parameters: batch ─▶ individual fallback
//!                                     │ Vec<DeploymentTask>
//!                                     ▼
//!                          deploy phase (per-package semaphore)
//!                          trigger ─▶ poll ─▶ STARTED / failed / timed out
//!                                     │
//!                                     ▼
//!                               RunStats summary
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use artifact_configure::cli::Cli;
use artifact_configure::config::{load_settings, validate_options, RunOptions};
use artifact_configure::observability::logging;
use artifact_configure::remote::{HttpRemote, RemoteApi};

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = load_settings(cli.settings.as_deref())?;
    logging::init(&settings.observability);

    tracing::info!("artifact-configure v{} starting", env!("CARGO_PKG_VERSION"));

    let options = RunOptions::resolve(&cli.overrides(), &settings.configure);
    if let Err(errors) = validate_options(&options, &settings.service) {
        for error in &errors {
            tracing::error!(%error, "Invalid option");
        }
        return Ok(ExitCode::from(2));
    }

    tracing::info!(
        config_path = %options.config_path.display(),
        dry_run = options.dry_run,
        deploy_retries = options.deploy_retries,
        deploy_delay_secs = options.deploy_delay.as_secs(),
        parallel_deployments = options.parallel_deployments,
        batch_size = options.batch_size,
        disable_batch = options.disable_batch,
        "Options resolved"
    );

    let remote: Option<Arc<dyn RemoteApi>> = if options.dry_run {
        None
    } else {
        Some(Arc::new(HttpRemote::new(&settings.service)?))
    };

    let report = match artifact_configure::run(&options, remote).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "Run aborted");
            return Ok(ExitCode::FAILURE);
        }
    };

    println!("{}", report.stats.summary(report.dry_run));

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
