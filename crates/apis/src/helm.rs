//! Helm release kind

use crate::interval::Interval;
use declarative::{Condition, Object, ResourceSpec, ResourceStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const API_VERSION: &str = "helm.toolkit.fluxcd.io/v2beta1";

/// A Helm release the helm controller installs and upgrades
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmReleaseSpec {
    pub chart: HelmChartTemplate,

    pub interval: Interval,

    /// Inline values merged over the chart defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Value>,

    /// Values read from other objects before the inline ones
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values_from: Vec<ValuesReference>,
}

impl ResourceSpec for HelmReleaseSpec {
    const KIND: &'static str = "HelmRelease";
    const API_VERSION: &'static str = API_VERSION;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelmChartTemplate {
    pub spec: HelmChartTemplateSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmChartTemplateSpec {
    /// Chart name in a Helm repository, or chart path in a git repository
    pub chart: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    pub source_ref: CrossNamespaceObjectReference,
}

/// Reference to the source object a chart is fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossNamespaceObjectReference {
    pub kind: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

/// Reference to a ConfigMap or Secret holding release values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuesReference {
    pub kind: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub values_key: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_path: String,

    /// Missing referents are skipped instead of failing the release
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmReleaseStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_applied_revision: String,
}

impl ResourceStatus for HelmReleaseStatus {
    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

pub type HelmRelease = Object<HelmReleaseSpec, HelmReleaseStatus>;
