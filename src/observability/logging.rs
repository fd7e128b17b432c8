//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Take the level from `RUST_LOG` when set, else from settings
//!
//! The end-of-run summary is printed, not logged, so it survives any
//! log filter.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber. A second call is a no-op.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

/// Subscriber for tests: captured output, debug level for this crate.
pub fn init_test() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("artifact_configure=debug"))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

fn default_directive(level: &str) -> String {
    let level = level.trim();
    if level.is_empty() {
        "artifact_configure=info".to_string()
    } else {
        format!("artifact_configure={level},warn")
    }
}
