//! Kustomization kind

use crate::interval::Interval;
use declarative::{Condition, Object, ResourceSpec, ResourceStatus};
use serde::{Deserialize, Serialize};

pub const API_VERSION: &str = "kustomize.toolkit.fluxcd.io/v1beta1";

/// A kustomize overlay the kustomize controller builds and applies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KustomizationSpec {
    /// Directory inside the source holding `kustomization.yaml`
    #[serde(default)]
    pub path: String,

    pub interval: Interval,

    /// Delete objects that disappear from the overlay
    #[serde(default)]
    pub prune: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_namespace: String,

    pub source_ref: CrossNamespaceSourceReference,
}

impl ResourceSpec for KustomizationSpec {
    const KIND: &'static str = "Kustomization";
    const API_VERSION: &'static str = API_VERSION;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossNamespaceSourceReference {
    pub kind: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KustomizationStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_applied_revision: String,
}

impl ResourceStatus for KustomizationStatus {
    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

pub type Kustomization = Object<KustomizationSpec, KustomizationStatus>;
