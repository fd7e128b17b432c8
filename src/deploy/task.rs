//! Deployment units queued by the configure phase.

use crate::manifest::ArtifactType;

/// "Deploy this artifact". Ids already carry the deployment prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTask {
    pub artifact_id: String,
    pub package_id: String,
    pub artifact_type: ArtifactType,
    pub display_name: String,
}
