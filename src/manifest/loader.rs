//! Declarative source loading and merging.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::manifest::schema::{apply_defaults, Configuration, RawConfiguration, SchemaError};

/// Error type for source loading.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("invalid source {path}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    #[error("no valid configuration files found in folder: {0}")]
    NoSources(PathBuf),
}

/// A parsed source together with where it came from.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub config: Configuration,
    pub path: PathBuf,
    pub file_name: String,
}

/// Load a single source file or every YAML file of a directory.
pub fn load_sources(path: &Path) -> Result<Vec<SourceFile>, LoadError> {
    let metadata = fs::metadata(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if metadata.is_dir() {
        load_directory(path)
    } else {
        Ok(vec![load_file(path)?])
    }
}

/// Parse one source file. Every failure is returned to the caller.
pub fn load_file(path: &Path) -> Result<SourceFile, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_source(&content).map_err(|e| e.at(path))?;

    Ok(SourceFile {
        config,
        path: path.to_path_buf(),
        file_name: file_name(path),
    })
}

fn load_directory(dir: &Path) -> Result<Vec<SourceFile>, LoadError> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_yaml(path))
        .collect();
    candidates.sort();

    let mut sources = Vec::with_capacity(candidates.len());
    for path in candidates {
        match load_file(&path) {
            Ok(source) => sources.push(source),
            Err(e) => {
                tracing::warn!(file = %file_name(&path), error = %e, "Skipping configuration file");
            }
        }
    }

    if sources.is_empty() {
        return Err(LoadError::NoSources(dir.to_path_buf()));
    }

    tracing::info!(count = sources.len(), "Loaded configuration files from folder");
    Ok(sources)
}

/// Concatenate package lists in discovery order and resolve the prefix.
///
/// The override wins when non-empty, then the first source's prefix.
pub fn merge_sources(sources: &[SourceFile], override_prefix: Option<&str>) -> Configuration {
    let deployment_prefix = match override_prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => prefix.to_string(),
        None => sources
            .first()
            .map(|s| s.config.deployment_prefix.clone())
            .unwrap_or_default(),
    };

    let mut packages = Vec::new();
    for source in sources {
        tracing::info!(file = %source.file_name, "Merging packages");
        packages.extend(source.config.packages.iter().cloned());
    }

    Configuration {
        deployment_prefix,
        packages,
    }
}

enum ParseFailure {
    Yaml(serde_yaml_ng::Error),
    Schema(SchemaError),
}

impl ParseFailure {
    fn at(self, path: &Path) -> LoadError {
        let path = path.to_path_buf();
        match self {
            ParseFailure::Yaml(source) => LoadError::Parse { path, source },
            ParseFailure::Schema(source) => LoadError::Schema { path, source },
        }
    }
}

fn parse_source(content: &str) -> Result<Configuration, ParseFailure> {
    // An empty document deserialises as unit, not as an empty mapping.
    if content.trim().is_empty() {
        return Ok(Configuration::default());
    }
    let raw: RawConfiguration = serde_yaml_ng::from_str(content).map_err(ParseFailure::Yaml)?;
    apply_defaults(raw).map_err(ParseFailure::Schema)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
