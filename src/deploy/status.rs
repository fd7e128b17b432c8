//! Runtime status classification.
//!
//! Raw version/status strings from the tenant are mapped here, once, into
//! [`DeployStatus`]; the state machine only matches on the enum.

use crate::remote::{RuntimeStatus, NOT_DEPLOYED};

const STARTED: &str = "STARTED";
const STARTING: &str = "STARTING";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployStatus {
    /// The tenant does not report the new deployment yet.
    NotYetVisible,
    Starting,
    Started,
    /// Any other status; carries the raw value.
    Failed(String),
}

impl DeployStatus {
    pub fn classify(runtime: &RuntimeStatus) -> Self {
        if runtime.version == NOT_DEPLOYED {
            return DeployStatus::NotYetVisible;
        }
        match runtime.status.as_str() {
            STARTED => DeployStatus::Started,
            STARTING => DeployStatus::Starting,
            other => DeployStatus::Failed(other.to_string()),
        }
    }
}
