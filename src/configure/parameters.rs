//! Parameter update engine.
//!
//! # Responsibilities
//! - Choose batch or individual updates per artifact
//! - Verify declared keys exist before batching
//! - Fall back to individual updates once when a batch cannot be sent
//! - Tally updated/failed parameters without aborting on the first failure
//!
//! Values already applied are never rolled back; a single failed
//! parameter marks the whole artifact as failed for the run.

use std::collections::HashMap;

use thiserror::Error;

use crate::manifest::{Artifact, Parameter};
use crate::remote::{BatchOperation, RemoteApi, RemoteError};
use crate::stats::RunStats;

#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("failed to get current configuration: {0}")]
    Read(#[source] RemoteError),

    #[error("none of the {declared} declared parameters exist on the artifact")]
    NoValidParameters { declared: usize },

    #[error("{failed} of {total} parameters failed to update in batch")]
    Batch { failed: usize, total: usize },

    #[error("{failed} of {total} parameters failed to update")]
    Individual { failed: usize, total: usize },
}

/// How an artifact's parameters are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStrategy {
    Batch { chunk_size: usize },
    Individual,
}

/// Pick the strategy for one artifact.
///
/// Batching needs the artifact's batch settings (enabled when absent) and
/// no global opt-out. The artifact's chunk size wins over the global one.
pub fn choose_strategy(artifact: &Artifact, batch_size: usize, disable_batch: bool) -> UpdateStrategy {
    let (enabled, chunk_size) = match &artifact.batch {
        Some(settings) => (settings.enabled, settings.batch_size),
        None => (true, batch_size),
    };

    if enabled && !disable_batch && !artifact.parameters.is_empty() {
        UpdateStrategy::Batch {
            chunk_size: chunk_size.max(1),
        }
    } else {
        UpdateStrategy::Individual
    }
}

/// Counters and verdict of one artifact's update.
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub updated: usize,
    pub failed: usize,
    pub batch_requests: usize,
    pub individual_requests: usize,
    /// Set when a batch transport failure switched to individual updates.
    pub fell_back: bool,
    pub error: Option<ParameterError>,
}

impl UpdateReport {
    /// Add this report's counters to the run totals.
    pub fn record(&self, stats: &mut RunStats) {
        stats.parameters_updated += self.updated;
        stats.parameters_failed += self.failed;
        stats.batch_requests_executed += self.batch_requests;
        stats.individual_requests_used += self.individual_requests;
    }
}

/// Applies declared parameter values to one artifact at a time.
pub struct ParameterUpdater<'a> {
    remote: &'a dyn RemoteApi,
    batch_size: usize,
    disable_batch: bool,
}

impl<'a> ParameterUpdater<'a> {
    pub fn new(remote: &'a dyn RemoteApi, batch_size: usize, disable_batch: bool) -> Self {
        Self {
            remote,
            batch_size,
            disable_batch,
        }
    }

    /// Update every declared parameter of `artifact` under `artifact_id`.
    pub async fn update(&self, artifact_id: &str, artifact: &Artifact) -> UpdateReport {
        match choose_strategy(artifact, self.batch_size, self.disable_batch) {
            UpdateStrategy::Batch { chunk_size } => {
                self.update_batch(artifact_id, &artifact.version, &artifact.parameters, chunk_size)
                    .await
            }
            UpdateStrategy::Individual => {
                self.update_individual(artifact_id, &artifact.version, &artifact.parameters)
                    .await
            }
        }
    }

    async fn update_batch(
        &self,
        artifact_id: &str,
        version: &str,
        parameters: &[Parameter],
        chunk_size: usize,
    ) -> UpdateReport {
        tracing::info!(artifact = %artifact_id, batch_size = chunk_size, "Using batch operations");

        let current = match self.remote.read_parameters(artifact_id, version).await {
            Ok(current) => current,
            Err(e) => {
                return UpdateReport {
                    error: Some(ParameterError::Read(e)),
                    ..UpdateReport::default()
                };
            }
        };
        let remote_values: HashMap<&str, &str> = current
            .iter()
            .map(|p| (p.key.as_str(), p.value.as_str()))
            .collect();

        let mut report = UpdateReport::default();
        let mut operations = Vec::with_capacity(parameters.len());
        for param in parameters {
            let Some(previous) = remote_values.get(param.key.as_str()) else {
                tracing::warn!(artifact = %artifact_id, key = %param.key, "Parameter not found in artifact, skipping");
                report.failed += 1;
                continue;
            };
            tracing::debug!(artifact = %artifact_id, key = %param.key, from = %previous, to = %param.value, "Queueing parameter update");
            operations.push(BatchOperation {
                artifact_id: artifact_id.to_string(),
                version: version.to_string(),
                key: param.key.clone(),
                value: param.value.clone(),
            });
        }

        if operations.is_empty() {
            report.error = Some(ParameterError::NoValidParameters {
                declared: parameters.len(),
            });
            return report;
        }

        let submitted = operations.len();
        let chunks = submitted.div_ceil(chunk_size);
        let outcomes = match self.remote.execute_batch(operations, chunk_size).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                tracing::warn!(artifact = %artifact_id, error = %e, "Batch operation failed, falling back to individual requests");
                let mut fallback = self.update_individual(artifact_id, version, parameters).await;
                fallback.fell_back = true;
                return fallback;
            }
        };
        report.batch_requests += chunks;

        let mut op_failures = 0;
        for outcome in &outcomes {
            if outcome.is_success() {
                report.updated += 1;
            } else {
                tracing::error!(
                    artifact = %artifact_id,
                    key = %outcome.key,
                    status = outcome.status,
                    error = outcome.error.as_deref().unwrap_or_default(),
                    "Failed to update parameter in batch"
                );
                op_failures += 1;
            }
        }
        // Operations the executor did not report on did not succeed.
        op_failures += submitted.saturating_sub(outcomes.len());
        report.failed += op_failures;

        if op_failures > 0 {
            report.error = Some(ParameterError::Batch {
                failed: op_failures,
                total: submitted,
            });
        }
        report
    }

    async fn update_individual(
        &self,
        artifact_id: &str,
        version: &str,
        parameters: &[Parameter],
    ) -> UpdateReport {
        tracing::info!(artifact = %artifact_id, "Using individual requests");

        let mut report = UpdateReport::default();
        for param in parameters {
            report.individual_requests += 1;
            match self
                .remote
                .set_parameter(artifact_id, version, &param.key, &param.value)
                .await
            {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    tracing::error!(artifact = %artifact_id, key = %param.key, error = %e, "Failed to update parameter");
                    report.failed += 1;
                }
            }
        }

        if report.failed > 0 {
            report.error = Some(ParameterError::Individual {
                failed: report.failed,
                total: parameters.len(),
            });
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ArtifactType, BatchSettings};

    fn artifact(params: usize, batch: Option<BatchSettings>) -> Artifact {
        Artifact {
            id: "Flow1".into(),
            display_name: String::new(),
            artifact_type: ArtifactType::Integration,
            version: "active".into(),
            deploy: false,
            parameters: (0..params)
                .map(|i| Parameter {
                    key: format!("K{i}"),
                    value: format!("V{i}"),
                })
                .collect(),
            batch,
        }
    }

    #[test]
    fn test_strategy_defaults_to_batch_with_global_size() {
        assert_eq!(
            choose_strategy(&artifact(3, None), 90, false),
            UpdateStrategy::Batch { chunk_size: 90 }
        );
    }

    #[test]
    fn test_strategy_artifact_size_overrides_global() {
        let settings = BatchSettings { enabled: true, batch_size: 2 };
        assert_eq!(
            choose_strategy(&artifact(3, Some(settings)), 90, false),
            UpdateStrategy::Batch { chunk_size: 2 }
        );
    }

    #[test]
    fn test_strategy_individual_when_disabled() {
        let settings = BatchSettings { enabled: false, batch_size: 2 };
        assert_eq!(
            choose_strategy(&artifact(3, Some(settings)), 90, false),
            UpdateStrategy::Individual
        );
        assert_eq!(choose_strategy(&artifact(3, None), 90, true), UpdateStrategy::Individual);
        assert_eq!(choose_strategy(&artifact(0, None), 90, false), UpdateStrategy::Individual);
    }

    #[test]
    fn test_report_records_into_stats() {
        let report = UpdateReport {
            updated: 3,
            failed: 1,
            batch_requests: 2,
            individual_requests: 0,
            fell_back: false,
            error: None,
        };
        let mut stats = RunStats::default();
        report.record(&mut stats);
        report.record(&mut stats);
        assert_eq!(stats.parameters_updated, 6);
        assert_eq!(stats.parameters_failed, 2);
        assert_eq!(stats.batch_requests_executed, 4);
    }
}
