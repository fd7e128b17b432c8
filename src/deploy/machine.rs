//! Per-artifact deployment state machine.
//!
//! # States
//! ```text
//! Trigger ──trigger ok──▶ Poll{1} ──STARTING / not visible / query error──▶ Poll{n+1}
//!    │                       │
//!    │ trigger failed        ├──STARTED──────────▶ Done(Succeeded)
//!    ▼                       ├──other status─────▶ Done(Failed, with error detail)
//! Done(Failed)               └──n > max_retries──▶ Done(TimedOut)
//! ```
//!
//! Every poll is preceded by the fixed delay. A failed status waits one more
//! delay before the error detail is fetched.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;

use crate::deploy::status::DeployStatus;
use crate::deploy::task::DeploymentTask;
use crate::remote::{RemoteApi, RemoteError};

/// Polling limits for one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("failed to initiate deployment: {0}")]
    Trigger(#[source] RemoteError),

    #[error("deployment failed with status {status}: {detail}")]
    Status { status: String, detail: String },

    #[error("deployment failed with status {status}: {source}")]
    StatusDetailUnavailable {
        status: String,
        #[source]
        source: RemoteError,
    },

    #[error("deployment gate closed before the unit could start")]
    GateClosed,
}

/// Terminal state of a deployment.
#[derive(Debug)]
pub enum DeployOutcome {
    Succeeded { attempts: u32 },
    Failed(DeployError),
    TimedOut { attempts: u32 },
}

impl DeployOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeployOutcome::Succeeded { .. })
    }
}

impl fmt::Display for DeployOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployOutcome::Succeeded { attempts } => {
                write!(f, "deployment started after {attempts} status checks")
            }
            DeployOutcome::Failed(e) => write!(f, "{e}"),
            DeployOutcome::TimedOut { attempts } => {
                write!(f, "deployment status check timed out after {attempts} attempts")
            }
        }
    }
}

enum State {
    Trigger,
    Poll { attempt: u32 },
    Done(DeployOutcome),
}

/// Deploy one artifact and wait for a terminal status.
pub async fn deploy_artifact(
    remote: &dyn RemoteApi,
    task: &DeploymentTask,
    policy: &DeployPolicy,
) -> DeployOutcome {
    let id = task.artifact_id.as_str();
    let mut state = State::Trigger;

    loop {
        state = match state {
            State::Trigger => {
                tracing::info!(artifact = %id, artifact_type = %task.artifact_type, "Deploying");
                match remote.trigger_deployment(id, task.artifact_type).await {
                    Ok(()) => {
                        tracing::info!(artifact = %id, "Deployment triggered");
                        State::Poll { attempt: 1 }
                    }
                    Err(e) => State::Done(DeployOutcome::Failed(DeployError::Trigger(e))),
                }
            }
            State::Poll { attempt } if attempt > policy.max_retries => {
                State::Done(DeployOutcome::TimedOut {
                    attempts: policy.max_retries,
                })
            }
            State::Poll { attempt } => {
                sleep(policy.delay).await;
                poll_once(remote, id, attempt, policy).await
            }
            State::Done(outcome) => return outcome,
        };
    }
}

async fn poll_once(remote: &dyn RemoteApi, id: &str, attempt: u32, policy: &DeployPolicy) -> State {
    let next = State::Poll { attempt: attempt + 1 };

    let runtime = match remote.runtime_status(id).await {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::warn!(
                artifact = %id,
                attempt,
                max_retries = policy.max_retries,
                error = %e,
                "Failed to get deployment status"
            );
            return next;
        }
    };

    tracing::info!(
        artifact = %id,
        attempt,
        max_retries = policy.max_retries,
        status = %runtime.status,
        version = %runtime.version,
        "Checked deployment status"
    );

    match DeployStatus::classify(&runtime) {
        DeployStatus::NotYetVisible | DeployStatus::Starting => next,
        DeployStatus::Started => State::Done(DeployOutcome::Succeeded { attempts: attempt }),
        DeployStatus::Failed(status) => {
            sleep(policy.delay).await;
            let error = match remote.error_information(id).await {
                Ok(detail) => DeployError::Status { status, detail },
                Err(source) => DeployError::StatusDetailUnavailable { status, source },
            };
            State::Done(DeployOutcome::Failed(error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        let outcome = DeployOutcome::TimedOut { attempts: 5 };
        assert_eq!(outcome.to_string(), "deployment status check timed out after 5 attempts");
        assert!(!outcome.is_success());

        let outcome = DeployOutcome::Failed(DeployError::Status {
            status: "ERROR".into(),
            detail: "Bean not found".into(),
        });
        assert_eq!(outcome.to_string(), "deployment failed with status ERROR: Bean not found");

        assert!(DeployOutcome::Succeeded { attempts: 1 }.is_success());
    }

    #[test]
    fn test_degraded_detail_message() {
        let error = DeployError::StatusDetailUnavailable {
            status: "ERROR".into(),
            source: RemoteError::Status {
                status: 500,
                body: "boom".into(),
            },
        };
        assert_eq!(error.to_string(), "deployment failed with status ERROR: HTTP 500: boom");
    }
}
