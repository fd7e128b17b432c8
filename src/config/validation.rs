//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Deployment prefix character set
//! - Required values that may come from either the CLI or the file
//!
//! Validation is a pure function that returns all errors, not just the
//! first, and runs before any source is loaded.

use thiserror::Error;

use crate::config::options::RunOptions;
use crate::config::schema::ServiceConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("config path is required (--config-path or configure.config_path)")]
    MissingConfigPath,

    #[error("deployment prefix '{0}' may only contain letters, digits and underscores")]
    InvalidPrefix(String),

    #[error("service.base_url is required unless running with --dry-run")]
    MissingBaseUrl,
}

/// A prefix is valid when empty or made of ASCII letters, digits and `_`.
pub fn validate_prefix(prefix: &str) -> Result<(), ValidationError> {
    if prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::InvalidPrefix(prefix.to_string()))
    }
}

/// Check resolved options against the service settings.
pub fn validate_options(
    options: &RunOptions,
    service: &ServiceConfig,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if options.config_path.as_os_str().is_empty() {
        errors.push(ValidationError::MissingConfigPath);
    }

    if let Some(prefix) = &options.deployment_prefix {
        if let Err(e) = validate_prefix(prefix) {
            errors.push(e);
        }
    }

    if !options.dry_run && service.base_url.trim().is_empty() {
        errors.push(ValidationError::MissingBaseUrl);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ConfigureConfig;

    fn options(path: &str, prefix: Option<&str>, dry_run: bool) -> RunOptions {
        let file = ConfigureConfig {
            config_path: Some(path.to_string()),
            deployment_prefix: prefix.map(str::to_string),
            dry_run: Some(dry_run),
            ..ConfigureConfig::default()
        };
        RunOptions::resolve(&ConfigureConfig::default(), &file)
    }

    #[test]
    fn test_prefix_charset() {
        assert!(validate_prefix("").is_ok());
        assert!(validate_prefix("DEV_01").is_ok());
        assert_eq!(
            validate_prefix("DEV-"),
            Err(ValidationError::InvalidPrefix("DEV-".into()))
        );
        assert!(validate_prefix("QA ").is_err());
    }

    #[test]
    fn test_all_errors_reported() {
        let errors = validate_options(&options("", Some("bad prefix"), false), &ServiceConfig::default())
            .unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingConfigPath,
                ValidationError::InvalidPrefix("bad prefix".into()),
                ValidationError::MissingBaseUrl,
            ]
        );
    }

    #[test]
    fn test_dry_run_needs_no_service() {
        assert!(validate_options(&options("./configs", Some("DEV_"), true), &ServiceConfig::default()).is_ok());
    }
}
