//! Package and artifact name filters.
//!
//! Names match the declared (unprefixed) ids, case-sensitively. An empty
//! filter includes everything.

use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    names: HashSet<String>,
}

impl NameFilter {
    /// Build a filter from a comma-separated list.
    pub fn parse(list: Option<&str>) -> Self {
        let names = list
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        Self { names }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn includes(&self, id: &str) -> bool {
        self.names.is_empty() || self.names.contains(id)
    }
}

/// Package and artifact filters applied together during phase 1.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub packages: NameFilter,
    pub artifacts: NameFilter,
}

impl Selection {
    pub fn new(packages: Option<&str>, artifacts: Option<&str>) -> Self {
        Self {
            packages: NameFilter::parse(packages),
            artifacts: NameFilter::parse(artifacts),
        }
    }

    pub fn includes_package(&self, package_id: &str) -> bool {
        self.packages.includes(package_id)
    }

    pub fn includes_artifact(&self, artifact_id: &str) -> bool {
        self.artifacts.includes(artifact_id)
    }
}
