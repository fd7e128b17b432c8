//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use artifact_configure::config::RunOptions;
use artifact_configure::manifest::ArtifactType;
use artifact_configure::remote::{
    partition, BatchOperation, OperationOutcome, RemoteApi, RemoteError, RemoteParameter,
    RemoteResult, RuntimeStatus,
};

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Read(String),
    Set { artifact: String, key: String },
    /// Chunk sizes of one `execute_batch` invocation.
    Batch(Vec<usize>),
    Trigger(String),
    Status(String),
    ErrorInfo(String),
}

impl Call {
    pub fn artifact(&self) -> Option<&str> {
        match self {
            Call::Read(a) | Call::Trigger(a) | Call::Status(a) | Call::ErrorInfo(a) => Some(a),
            Call::Set { artifact, .. } => Some(artifact),
            Call::Batch(_) => None,
        }
    }
}

/// Scripted answer to a status query.
#[derive(Debug, Clone)]
pub enum Poll {
    Status(&'static str, &'static str),
    Error,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    in_flight: HashMap<String, usize>,
    max_in_flight: HashMap<String, usize>,
    global_in_flight: usize,
    max_global_in_flight: usize,
}

/// In-memory tenant.
///
/// Package membership for concurrency tracking is taken from the part of
/// the artifact id before the first '.'.
#[derive(Default)]
pub struct MockRemote {
    state: Mutex<State>,
    known_keys: HashSet<String>,
    polls: Mutex<HashMap<String, VecDeque<Poll>>>,
    batch_transport_error: bool,
    failing_keys: HashSet<String>,
    failing_triggers: HashSet<String>,
    error_info_unavailable: bool,
    error_detail: String,
    status_latency: Duration,
}

impl MockRemote {
    pub fn new() -> Self {
        Self {
            error_detail: "Bean not found".into(),
            ..Self::default()
        }
    }

    /// Keys reported by `read_parameters` for every artifact.
    pub fn with_keys(mut self, keys: &[&str]) -> Self {
        self.known_keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    /// Script status answers for one artifact; the last answer repeats.
    pub fn with_polls(self, artifact: &str, polls: Vec<Poll>) -> Self {
        self.polls
            .lock()
            .unwrap()
            .insert(artifact.to_string(), polls.into());
        self
    }

    pub fn with_batch_transport_error(mut self) -> Self {
        self.batch_transport_error = true;
        self
    }

    pub fn with_failing_key(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    pub fn with_failing_trigger(mut self, artifact: &str) -> Self {
        self.failing_triggers.insert(artifact.to_string());
        self
    }

    pub fn with_failing_error_info(mut self) -> Self {
        self.error_info_unavailable = true;
        self
    }

    /// Time each status query takes.
    pub fn with_status_latency(mut self, latency: Duration) -> Self {
        self.status_latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn max_in_flight(&self, package: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .max_in_flight
            .get(package)
            .copied()
            .unwrap_or(0)
    }

    pub fn max_global_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_global_in_flight
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn enter(&self, artifact: &str) {
        let mut state = self.state.lock().unwrap();
        let package = package_of(artifact);
        let current = state.in_flight.entry(package.clone()).or_default();
        *current += 1;
        let current = *current;
        let max = state.max_in_flight.entry(package).or_default();
        *max = (*max).max(current);
        state.global_in_flight += 1;
        state.max_global_in_flight = state.max_global_in_flight.max(state.global_in_flight);
    }

    fn leave(&self, artifact: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(current) = state.in_flight.get_mut(&package_of(artifact)) {
            *current = current.saturating_sub(1);
        }
        state.global_in_flight = state.global_in_flight.saturating_sub(1);
    }

    fn next_poll(&self, artifact: &str) -> Poll {
        let mut polls = self.polls.lock().unwrap();
        match polls.get_mut(artifact) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(Poll::Status("1.0.0", "STARTED")),
            None => Poll::Status("1.0.0", "STARTED"),
        }
    }
}

fn package_of(artifact: &str) -> String {
    artifact.split('.').next().unwrap_or(artifact).to_string()
}

#[async_trait]
impl RemoteApi for MockRemote {
    async fn read_parameters(
        &self,
        artifact_id: &str,
        _version: &str,
    ) -> RemoteResult<Vec<RemoteParameter>> {
        self.record(Call::Read(artifact_id.to_string()));
        Ok(self
            .known_keys
            .iter()
            .map(|key| RemoteParameter {
                key: key.clone(),
                value: String::new(),
            })
            .collect())
    }

    async fn set_parameter(
        &self,
        artifact_id: &str,
        _version: &str,
        key: &str,
        _value: &str,
    ) -> RemoteResult<()> {
        self.record(Call::Set {
            artifact: artifact_id.to_string(),
            key: key.to_string(),
        });
        if self.failing_keys.contains(key) {
            return Err(RemoteError::Status {
                status: 400,
                body: "invalid value".into(),
            });
        }
        Ok(())
    }

    async fn execute_batch(
        &self,
        operations: Vec<BatchOperation>,
        chunk_size: usize,
    ) -> RemoteResult<Vec<OperationOutcome>> {
        let chunks = partition(&operations, chunk_size);
        self.record(Call::Batch(chunks.iter().map(|c| c.len()).collect()));
        if self.batch_transport_error {
            return Err(RemoteError::Transport("connection reset".into()));
        }
        Ok(operations
            .iter()
            .map(|op| {
                if self.failing_keys.contains(&op.key) {
                    OperationOutcome {
                        key: op.key.clone(),
                        status: 400,
                        error: Some("invalid value".into()),
                    }
                } else {
                    OperationOutcome {
                        key: op.key.clone(),
                        status: 202,
                        error: None,
                    }
                }
            })
            .collect())
    }

    async fn trigger_deployment(
        &self,
        artifact_id: &str,
        _artifact_type: ArtifactType,
    ) -> RemoteResult<()> {
        self.record(Call::Trigger(artifact_id.to_string()));
        if self.failing_triggers.contains(artifact_id) {
            return Err(RemoteError::Status {
                status: 500,
                body: "deployment rejected".into(),
            });
        }
        self.enter(artifact_id);
        Ok(())
    }

    async fn runtime_status(&self, artifact_id: &str) -> RemoteResult<RuntimeStatus> {
        self.record(Call::Status(artifact_id.to_string()));
        if !self.status_latency.is_zero() {
            tokio::time::sleep(self.status_latency).await;
        }
        match self.next_poll(artifact_id) {
            Poll::Error => Err(RemoteError::Transport("timed out".into())),
            Poll::Status(version, status) => {
                if status != "STARTING" && version != "NOT_DEPLOYED" {
                    self.leave(artifact_id);
                }
                Ok(RuntimeStatus {
                    version: version.into(),
                    status: status.into(),
                })
            }
        }
    }

    async fn error_information(&self, artifact_id: &str) -> RemoteResult<String> {
        self.record(Call::ErrorInfo(artifact_id.to_string()));
        if self.error_info_unavailable {
            return Err(RemoteError::Status {
                status: 503,
                body: "service unavailable".into(),
            });
        }
        Ok(self.error_detail.clone())
    }
}

/// Write `content` as a YAML source under `dir`.
pub fn write_source(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Options for fast test runs against `config_path`.
pub fn options(config_path: &Path) -> RunOptions {
    RunOptions {
        config_path: config_path.to_path_buf(),
        deployment_prefix: None,
        package_filter: None,
        artifact_filter: None,
        dry_run: false,
        deploy_retries: 5,
        deploy_delay: Duration::from_millis(5),
        parallel_deployments: 3,
        batch_size: 90,
        disable_batch: false,
    }
}
