//! Bounded-parallel deployment scheduler.
//!
//! # Responsibilities
//! - Group tasks by (prefixed) package id
//! - Gate each package with its own semaphore of `parallel_deployments`
//! - Run every task as its own tokio task; siblings never cancel each other
//! - Fan results into one channel and aggregate them after all units finish
//!
//! The bound is per package: two packages deploying at once may run up to
//! twice the configured limit in total.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::deploy::machine::{deploy_artifact, DeployError, DeployOutcome, DeployPolicy};
use crate::deploy::task::DeploymentTask;
use crate::remote::RemoteApi;
use crate::stats::RunStats;

/// Outcome of one deployment unit.
#[derive(Debug)]
pub struct DeploymentResult {
    pub task: DeploymentTask,
    pub outcome: DeployOutcome,
}

pub struct DeploymentScheduler {
    remote: Arc<dyn RemoteApi>,
    policy: DeployPolicy,
    parallel_deployments: usize,
}

impl DeploymentScheduler {
    pub fn new(remote: Arc<dyn RemoteApi>, policy: DeployPolicy, parallel_deployments: usize) -> Self {
        Self {
            remote,
            policy,
            parallel_deployments: parallel_deployments.max(1),
        }
    }

    /// Deploy every task and record the results into `stats`.
    pub async fn run(&self, tasks: Vec<DeploymentTask>, stats: &mut RunStats) -> Vec<DeploymentResult> {
        if tasks.is_empty() {
            return Vec::new();
        }

        let total = tasks.len();
        let packages = group_by_package(tasks);
        tracing::info!(
            tasks = total,
            packages = packages.len(),
            max_parallel_per_package = self.parallel_deployments,
            "Deploying artifacts"
        );

        let (results_tx, mut results_rx) = mpsc::channel(total);
        let mut workers = JoinSet::new();

        for (package_id, package_tasks) in packages {
            tracing::info!(package = %package_id, artifacts = package_tasks.len(), "Deploying package");
            let gate = Arc::new(Semaphore::new(self.parallel_deployments));

            for task in package_tasks {
                let gate = gate.clone();
                let remote = self.remote.clone();
                let results_tx = results_tx.clone();
                let policy = self.policy;

                workers.spawn(async move {
                    let result = run_gated(gate, remote.as_ref(), task, &policy).await;
                    // Capacity equals the task count, so this never waits.
                    let _ = results_tx.send(result).await;
                });
            }
        }
        drop(results_tx);

        let mut aborted = 0;
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Deployment worker aborted");
                aborted += 1;
            }
        }

        let mut results = Vec::with_capacity(total);
        while let Some(result) = results_rx.recv().await {
            record(&result, stats);
            results.push(result);
        }
        stats.deployment_tasks_failed += aborted;

        results
    }
}

/// Run one unit while holding a permit of its package gate.
///
/// A closed gate fails the unit instead of running it unbounded.
async fn run_gated(
    gate: Arc<Semaphore>,
    remote: &dyn RemoteApi,
    task: DeploymentTask,
    policy: &DeployPolicy,
) -> DeploymentResult {
    let _permit = match gate.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            tracing::error!(artifact = %task.artifact_id, package = %task.package_id, "Deployment gate closed");
            return DeploymentResult {
                task,
                outcome: DeployOutcome::Failed(DeployError::GateClosed),
            };
        }
    };
    let outcome = deploy_artifact(remote, &task, policy).await;
    DeploymentResult { task, outcome }
}

fn group_by_package(tasks: Vec<DeploymentTask>) -> BTreeMap<String, Vec<DeploymentTask>> {
    let mut packages: BTreeMap<String, Vec<DeploymentTask>> = BTreeMap::new();
    for task in tasks {
        packages.entry(task.package_id.clone()).or_default().push(task);
    }
    packages
}

fn record(result: &DeploymentResult, stats: &mut RunStats) {
    let id = &result.task.artifact_id;
    if result.outcome.is_success() {
        tracing::info!(artifact = %id, "Successfully deployed");
        stats.deployment_tasks_succeeded += 1;
        stats.artifacts_deployed += 1;
    } else {
        tracing::error!(artifact = %id, error = %result.outcome, "Failed to deploy");
        stats.deployment_tasks_failed += 1;
    }
}
