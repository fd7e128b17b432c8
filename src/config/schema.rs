//! Settings schema definitions.
//!
//! The optional settings file carries tenant connection details and
//! defaults for every command-line control. All types derive Serde traits
//! for deserialization from TOML.

use serde::{Deserialize, Serialize};

/// Default number of status polls per deployment.
pub const DEFAULT_DEPLOY_RETRIES: u32 = 5;
/// Default delay between status polls, in seconds.
pub const DEFAULT_DEPLOY_DELAY_SECS: u64 = 15;
/// Default number of concurrent deployments per package.
pub const DEFAULT_PARALLEL_DEPLOYMENTS: usize = 3;
/// Default number of operations per batch request.
pub const DEFAULT_BATCH_SIZE: usize = 90;

/// Root of the settings file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Tenant connection.
    pub service: ServiceConfig,

    /// Defaults for the configure run.
    pub configure: ConfigureConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Tenant connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the tenant (e.g., "https://tenant.example.com").
    pub base_url: String,

    /// Basic-auth user.
    pub username: String,

    /// Basic-auth password.
    pub password: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_secs: 60,
        }
    }
}

/// Settings-file counterparts of the command-line controls.
///
/// Unset or zero numeric values fall back to the built-in defaults.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ConfigureConfig {
    /// File or folder of declarative sources.
    pub config_path: Option<String>,

    /// Prefix override for package and artifact ids.
    pub deployment_prefix: Option<String>,

    /// Comma-separated package ids to include.
    pub package_filter: Option<String>,

    /// Comma-separated artifact ids to include.
    pub artifact_filter: Option<String>,

    /// Preview only; no remote changes.
    pub dry_run: Option<bool>,

    /// Status polls per deployment.
    pub deploy_retries: Option<u32>,

    /// Delay between status polls in seconds.
    pub deploy_delay_secs: Option<u64>,

    /// Concurrent deployments per package.
    pub parallel_deployments: Option<usize>,

    /// Operations per batch request.
    pub batch_size: Option<usize>,

    /// Use individual requests only.
    pub disable_batch: Option<bool>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
