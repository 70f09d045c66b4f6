//! Source kinds: git and Helm repositories

use crate::interval::Interval;
use declarative::{Condition, Object, ResourceSpec, ResourceStatus};
use serde::{Deserialize, Serialize};

pub const API_VERSION: &str = "source.toolkit.fluxcd.io/v1beta1";

/// A git repository the source controller keeps checked out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRepositorySpec {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<GitRepositoryRef>,

    pub interval: Interval,
}

impl ResourceSpec for GitRepositorySpec {
    const KIND: &'static str = "GitRepository";
    const API_VERSION: &'static str = API_VERSION;
}

/// Branch or tag to check out
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRepositoryRef {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
}

impl GitRepositoryRef {
    pub fn branch(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            ..Default::default()
        }
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }
}

/// A Helm chart repository index the source controller polls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmRepositorySpec {
    pub url: String,
    pub interval: Interval,
}

impl ResourceSpec for HelmRepositorySpec {
    const KIND: &'static str = "HelmRepository";
    const API_VERSION: &'static str = API_VERSION;
}

/// Status shared by both source kinds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Where the fetched artifact can be downloaded from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
}

impl ResourceStatus for SourceStatus {
    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

pub type GitRepository = Object<GitRepositorySpec, SourceStatus>;
pub type HelmRepository = Object<HelmRepositorySpec, SourceStatus>;
