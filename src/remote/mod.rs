//! Remote tenant capabilities.
//!
//! # Data Flow
//! ```text
//! configure phase:
//!     read_parameters → verify declared keys
//!     execute_batch / set_parameter → apply values
//!
//! deploy phase:
//!     trigger_deployment → runtime_status (polled) → error_information
//! ```
//!
//! # Design Decisions
//! - The engine only sees the `RemoteApi` trait; `http.rs` is one adapter
//! - Batch chunking belongs to the executor, the engine passes a size
//! - Runtime status stays raw here and is classified by the deploy module

pub mod batch;
pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::manifest::ArtifactType;

pub use batch::{partition, BatchOperation, OperationOutcome};
pub use http::HttpRemote;

/// Errors returned by remote capabilities.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Connection, TLS or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The tenant answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response could not be decoded.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else {
            RemoteError::Transport(e.to_string())
        }
    }
}

/// Runtime version reported for artifacts the tenant does not know yet.
pub const NOT_DEPLOYED: &str = "NOT_DEPLOYED";

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// A configuration parameter as currently stored on the tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteParameter {
    pub key: String,
    pub value: String,
}

/// Version and status of a deployed runtime artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeStatus {
    pub version: String,
    pub status: String,
}

/// The six capabilities the engine consumes.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Read the current parameters of an artifact version.
    async fn read_parameters(
        &self,
        artifact_id: &str,
        version: &str,
    ) -> RemoteResult<Vec<RemoteParameter>>;

    /// Set a single parameter value.
    async fn set_parameter(
        &self,
        artifact_id: &str,
        version: &str,
        key: &str,
        value: &str,
    ) -> RemoteResult<()>;

    /// Execute `operations` in chunks of at most `chunk_size`.
    ///
    /// `Err` means a transport-level failure. `Ok` carries one outcome per
    /// operation, in submission order.
    async fn execute_batch(
        &self,
        operations: Vec<BatchOperation>,
        chunk_size: usize,
    ) -> RemoteResult<Vec<OperationOutcome>>;

    /// Start deployment of a design-time artifact.
    async fn trigger_deployment(
        &self,
        artifact_id: &str,
        artifact_type: ArtifactType,
    ) -> RemoteResult<()>;

    /// Query the runtime version and status of an artifact.
    async fn runtime_status(&self, artifact_id: &str) -> RemoteResult<RuntimeStatus>;

    /// Fetch the detailed error of a failed deployment.
    async fn error_information(&self, artifact_id: &str) -> RemoteResult<String>;
}
