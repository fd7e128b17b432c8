//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (artifact, package, attempt)
//!
//! Consumers:
//!     → logging.rs (fmt subscriber on stderr, filtered by RUST_LOG or settings)
//! ```

pub mod logging;
