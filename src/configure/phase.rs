//! Configuration phase driver.
//!
//! Walks the merged configuration sequentially: filter, prefix, update
//! parameters, queue deployments. In preview mode nothing reaches the
//! remote and the counters record what an applied run would do.

use crate::configure::parameters::ParameterUpdater;
use crate::deploy::DeploymentTask;
use crate::manifest::{apply_prefix, should_deploy, Artifact, Configuration, Selection};
use crate::remote::RemoteApi;
use crate::stats::RunStats;

/// Whether parameter values are sent or only reported.
#[derive(Clone, Copy)]
pub enum Mode<'a> {
    Preview,
    Apply(&'a dyn RemoteApi),
}

pub struct ConfigurePhase<'a> {
    pub mode: Mode<'a>,
    pub selection: &'a Selection,
    pub batch_size: usize,
    pub disable_batch: bool,
}

impl ConfigurePhase<'_> {
    /// Configure every selected artifact and return the deployment queue.
    pub async fn run(&self, config: &Configuration, stats: &mut RunStats) -> Vec<DeploymentTask> {
        let prefix = config.deployment_prefix.as_str();
        let mut tasks = Vec::new();

        for package in &config.packages {
            if !self.selection.includes_package(&package.id) {
                tracing::debug!(package = %package.id, "Skipping package (filtered)");
                continue;
            }

            let package_id = apply_prefix(prefix, &package.id);
            tracing::info!(
                package = %package_id,
                display_name = %package.display_name,
                artifacts = package.artifacts.len(),
                "Processing package"
            );
            stats.packages_processed += 1;

            let mut package_has_error = false;
            for artifact in &package.artifacts {
                if !self.selection.includes_artifact(&artifact.id) {
                    tracing::debug!(artifact = %artifact.id, "Skipping artifact (filtered)");
                    continue;
                }
                stats.artifacts_processed += 1;

                let artifact_id = apply_prefix(prefix, &artifact.id);
                if !self.configure_artifact(&artifact_id, artifact, stats).await {
                    package_has_error = true;
                    continue;
                }

                if should_deploy(package, artifact) {
                    stats.deployment_tasks_queued += 1;
                    tasks.push(deployment_task(&package_id, &artifact_id, artifact));
                }
            }

            if package_has_error {
                stats.packages_with_errors += 1;
            }
        }

        tasks
    }

    /// Returns false when the artifact failed to configure.
    async fn configure_artifact(
        &self,
        artifact_id: &str,
        artifact: &Artifact,
        stats: &mut RunStats,
    ) -> bool {
        tracing::info!(
            artifact = %artifact_id,
            artifact_type = %artifact.artifact_type,
            version = %artifact.version,
            parameters = artifact.parameters.len(),
            "Processing artifact"
        );

        let remote = match self.mode {
            Mode::Preview => {
                for param in &artifact.parameters {
                    tracing::info!(artifact = %artifact_id, key = %param.key, value = %param.value, "Would update parameter");
                }
                stats.parameters_updated += artifact.parameters.len();
                stats.artifacts_configured += 1;
                return true;
            }
            Mode::Apply(remote) => remote,
        };

        let report = ParameterUpdater::new(remote, self.batch_size, self.disable_batch)
            .update(artifact_id, artifact)
            .await;
        report.record(stats);

        if report.fell_back {
            tracing::warn!(
                artifact = %artifact_id,
                individual_requests = report.individual_requests,
                "Parameters were sent individually after the batch failed"
            );
        }

        match &report.error {
            None => {
                tracing::info!(artifact = %artifact_id, updated = report.updated, "Artifact configured");
                stats.artifacts_configured += 1;
                true
            }
            Some(e) => {
                tracing::error!(artifact = %artifact_id, error = %e, "Failed to configure artifact");
                stats.artifacts_failed += 1;
                false
            }
        }
    }
}

fn deployment_task(package_id: &str, artifact_id: &str, artifact: &Artifact) -> DeploymentTask {
    DeploymentTask {
        artifact_id: artifact_id.to_string(),
        package_id: package_id.to_string(),
        artifact_type: artifact.artifact_type,
        display_name: artifact.display_name.clone(),
    }
}
