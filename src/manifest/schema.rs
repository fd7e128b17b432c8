//! Declarative source schema.
//!
//! Parsing happens in two steps: serde fills the `Raw*` documents, which
//! keep every optional field as `Option`, then [`apply_defaults`] turns a
//! raw document into the immutable [`Configuration`] the engine works with.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version used when an artifact does not pin one.
pub const DEFAULT_VERSION: &str = "active";

/// Chunk size used when batch settings omit `batchSize`.
pub const DEFAULT_BATCH_SIZE: usize = 90;

/// Errors raised while turning a raw document into a [`Configuration`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("package #{index}: missing integrationSuiteId")]
    MissingPackageId { index: usize },

    #[error("package {package}: artifact #{index}: missing artifactId")]
    MissingArtifactId { package: String, index: usize },

    #[error("artifact {artifact}: missing type")]
    MissingArtifactType { artifact: String },

    #[error("artifact {artifact}: parameter #{index}: missing {field}")]
    MissingParameterField {
        artifact: String,
        index: usize,
        field: &'static str,
    },

    #[error("artifact {artifact}: batchSize must be greater than 0")]
    InvalidBatchSize { artifact: String },
}

/// Kind of design-time artifact. Selects the deployment endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ArtifactType {
    Integration,
    MessageMapping,
    ScriptCollection,
    ValueMapping,
}

impl ArtifactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::Integration => "Integration",
            ArtifactType::MessageMapping => "MessageMapping",
            ArtifactType::ScriptCollection => "ScriptCollection",
            ArtifactType::ValueMapping => "ValueMapping",
        }
    }
}

impl std::fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ----- raw documents (serde) -----

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfiguration {
    pub deployment_prefix: Option<String>,
    #[serde(default)]
    pub packages: Vec<RawPackage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPackage {
    pub integration_suite_id: Option<String>,
    pub display_name: Option<String>,
    pub deploy: Option<bool>,
    #[serde(default)]
    pub artifacts: Vec<RawArtifact>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArtifact {
    pub artifact_id: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub artifact_type: Option<ArtifactType>,
    pub version: Option<String>,
    pub deploy: Option<bool>,
    #[serde(default)]
    pub parameters: Vec<RawParameter>,
    pub batch: Option<RawBatchSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawParameter {
    pub key: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBatchSettings {
    pub enabled: Option<bool>,
    pub batch_size: Option<usize>,
}

// ----- defaulted model -----

/// Root of one or more merged declarative sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    /// Prefix prepended to package and artifact ids. Empty means none.
    pub deployment_prefix: String,
    pub packages: Vec<Package>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub id: String,
    pub display_name: String,
    /// Deploy every artifact of the package after configuration.
    pub deploy: bool,
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub id: String,
    pub display_name: String,
    pub artifact_type: ArtifactType,
    pub version: String,
    pub deploy: bool,
    pub parameters: Vec<Parameter>,
    pub batch: Option<BatchSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    pub enabled: bool,
    pub batch_size: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Blanket-OR deploy rule: an artifact is deployed when it asks for it or
/// when its package does.
pub fn should_deploy(package: &Package, artifact: &Artifact) -> bool {
    artifact.deploy || package.deploy
}

/// Prepend `prefix` to `id`. An empty prefix leaves the id unchanged.
pub fn apply_prefix(prefix: &str, id: &str) -> String {
    if prefix.is_empty() {
        id.to_string()
    } else {
        format!("{prefix}{id}")
    }
}

/// Fill defaults and check required fields.
pub fn apply_defaults(raw: RawConfiguration) -> Result<Configuration, SchemaError> {
    let packages = raw
        .packages
        .into_iter()
        .enumerate()
        .map(|(index, package)| package_with_defaults(index, package))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Configuration {
        deployment_prefix: raw.deployment_prefix.unwrap_or_default(),
        packages,
    })
}

fn package_with_defaults(index: usize, raw: RawPackage) -> Result<Package, SchemaError> {
    let id = non_empty(raw.integration_suite_id).ok_or(SchemaError::MissingPackageId { index })?;

    let artifacts = raw
        .artifacts
        .into_iter()
        .enumerate()
        .map(|(i, artifact)| artifact_with_defaults(&id, i, artifact))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Package {
        id,
        display_name: raw.display_name.unwrap_or_default(),
        deploy: raw.deploy.unwrap_or(false),
        artifacts,
    })
}

fn artifact_with_defaults(
    package: &str,
    index: usize,
    raw: RawArtifact,
) -> Result<Artifact, SchemaError> {
    let id = non_empty(raw.artifact_id).ok_or_else(|| SchemaError::MissingArtifactId {
        package: package.to_string(),
        index,
    })?;
    let artifact_type = raw
        .artifact_type
        .ok_or_else(|| SchemaError::MissingArtifactType { artifact: id.clone() })?;

    let mut parameters = Vec::with_capacity(raw.parameters.len());
    for (i, param) in raw.parameters.into_iter().enumerate() {
        let key = non_empty(param.key).ok_or_else(|| SchemaError::MissingParameterField {
            artifact: id.clone(),
            index: i,
            field: "key",
        })?;
        // An empty value is a legitimate setting; only a missing one is not.
        let value = param.value.ok_or_else(|| SchemaError::MissingParameterField {
            artifact: id.clone(),
            index: i,
            field: "value",
        })?;
        parameters.push(Parameter { key, value });
    }

    let batch = match raw.batch {
        Some(settings) => {
            if settings.batch_size == Some(0) {
                return Err(SchemaError::InvalidBatchSize { artifact: id });
            }
            Some(BatchSettings {
                enabled: settings.enabled.unwrap_or(true),
                batch_size: settings.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            })
        }
        None => None,
    };

    Ok(Artifact {
        id,
        display_name: raw.display_name.unwrap_or_default(),
        artifact_type,
        version: non_empty(raw.version).unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        deploy: raw.deploy.unwrap_or(false),
        parameters,
        batch,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<Configuration, SchemaError> {
        let raw: RawConfiguration = serde_yaml_ng::from_str(yaml).unwrap();
        apply_defaults(raw)
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse(
            r#"
packages:
  - integrationSuiteId: Pkg1
    artifacts:
      - artifactId: Flow1
        type: Integration
        parameters:
          - key: Url
            value: http://example.com
        batch: {}
"#,
        )
        .unwrap();

        assert_eq!(config.deployment_prefix, "");
        let package = &config.packages[0];
        assert!(!package.deploy);
        let artifact = &package.artifacts[0];
        assert_eq!(artifact.version, "active");
        assert!(!artifact.deploy);
        assert_eq!(artifact.batch, Some(BatchSettings { enabled: true, batch_size: 90 }));
    }

    #[test]
    fn test_explicit_values_kept() {
        let config = parse(
            r#"
deploymentPrefix: DEV_
packages:
  - integrationSuiteId: Pkg1
    displayName: Package One
    deploy: true
    artifacts:
      - artifactId: Map1
        type: MessageMapping
        version: 1.0.3
        deploy: true
        batch:
          enabled: false
          batchSize: 10
"#,
        )
        .unwrap();

        assert_eq!(config.deployment_prefix, "DEV_");
        let artifact = &config.packages[0].artifacts[0];
        assert_eq!(artifact.artifact_type, ArtifactType::MessageMapping);
        assert_eq!(artifact.version, "1.0.3");
        assert_eq!(artifact.batch, Some(BatchSettings { enabled: false, batch_size: 10 }));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let err = parse(
            r#"
packages:
  - integrationSuiteId: Pkg1
    artifacts:
      - artifactId: Flow1
        type: Integration
        batch:
          batchSize: 0
"#,
        )
        .unwrap_err();
        assert_eq!(err, SchemaError::InvalidBatchSize { artifact: "Flow1".into() });
    }

    #[test]
    fn test_missing_required_fields() {
        let err = parse("packages:\n  - displayName: nope\n").unwrap_err();
        assert_eq!(err, SchemaError::MissingPackageId { index: 0 });

        let err = parse(
            "packages:\n  - integrationSuiteId: P\n    artifacts:\n      - artifactId: A\n",
        )
        .unwrap_err();
        assert_eq!(err, SchemaError::MissingArtifactType { artifact: "A".into() });

        let err = parse(
            r#"
packages:
  - integrationSuiteId: P
    artifacts:
      - artifactId: A
        type: Integration
        parameters:
          - key: K
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing value"));
    }

    #[test]
    fn test_deploy_rule_is_blanket_or() {
        let artifact = |deploy| Artifact {
            id: "A".into(),
            display_name: String::new(),
            artifact_type: ArtifactType::Integration,
            version: DEFAULT_VERSION.into(),
            deploy,
            parameters: Vec::new(),
            batch: None,
        };
        let package = |deploy| Package {
            id: "P".into(),
            display_name: String::new(),
            deploy,
            artifacts: Vec::new(),
        };

        assert!(!should_deploy(&package(false), &artifact(false)));
        assert!(should_deploy(&package(true), &artifact(false)));
        assert!(should_deploy(&package(false), &artifact(true)));
        assert!(should_deploy(&package(true), &artifact(true)));
    }

    #[test]
    fn test_apply_prefix() {
        assert_eq!(apply_prefix("DEV_", "Flow1"), "DEV_Flow1");
        assert_eq!(apply_prefix("", "Flow1"), "Flow1");
    }
}
