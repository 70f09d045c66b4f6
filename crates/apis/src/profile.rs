//! Profile definitions and instances
//!
//! A [`ProfileDefinition`] lists the artifacts a profile installs. A
//! [`ProfileInstance`] asks for one definition, by repository URL and branch,
//! to be installed into a namespace with a set of Helm values.

use crate::helm::ValuesReference;
use declarative::{Condition, NoStatus, Object, ResourceSpec, ResourceStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const API_VERSION: &str = "weave.works/v1alpha1";

/// Artifact kind tag for Helm charts
pub const HELM_CHART_KIND: &str = "HelmChart";

/// Artifact kind tag for kustomize overlays
pub const KUSTOMIZE_KIND: &str = "Kustomize";

/// An artifact declared more than one content source
#[derive(Debug, Error, PartialEq, Eq)]
#[error("validation failed for artifact {artifact}: expected exactly one, got both: {first}, {second}")]
pub struct ValidationError {
    pub artifact: String,
    pub first: &'static str,
    pub second: &'static str,
}

/// An artifact kind outside the supported set
#[derive(Debug, Error, PartialEq, Eq)]
#[error("artifact kind {0:?} not recognized")]
pub struct UnknownKindError(pub String);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDefinitionSpec {
    /// Free text identifying what the profile installs
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
}

impl ResourceSpec for ProfileDefinitionSpec {
    const KIND: &'static str = "ProfileDefinition";
    const API_VERSION: &'static str = API_VERSION;
}

/// One bundled component of a profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default)]
    pub name: String,

    /// `HelmChart` or `Kustomize`; checked when the artifact is built
    #[serde(default)]
    pub kind: String,

    /// Directory in the profile repository
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<Chart>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileRef>,
}

impl Artifact {
    /// Check that at most one content source is declared
    pub fn validate(&self) -> Result<(), ValidationError> {
        let both = |first, second| ValidationError {
            artifact: self.name.clone(),
            first,
            second,
        };
        let has_path = !self.path.is_empty();

        if self.chart.is_some() && has_path {
            return Err(both("chart", "path"));
        }
        if self.chart.is_some() && self.profile.is_some() {
            return Err(both("chart", "profile"));
        }
        if self.profile.is_some() && has_path {
            return Err(both("profile", "path"));
        }
        Ok(())
    }

    /// The content source, after validation
    ///
    /// An artifact with no source reads from the root of the profile
    /// repository.
    pub fn source(&self) -> Result<ArtifactSource<'_>, ValidationError> {
        self.validate()?;
        Ok(match (&self.chart, &self.profile) {
            (Some(chart), _) => ArtifactSource::Chart(chart),
            (None, Some(profile)) => ArtifactSource::Profile(profile),
            (None, None) => ArtifactSource::Path(&self.path),
        })
    }

    pub fn artifact_kind(&self) -> Result<ArtifactKind, UnknownKindError> {
        self.kind.parse()
    }
}

/// Closed set of artifact kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    HelmChart,
    Kustomize,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HelmChart => HELM_CHART_KIND,
            Self::Kustomize => KUSTOMIZE_KIND,
        }
    }
}

impl FromStr for ArtifactKind {
    type Err = UnknownKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            HELM_CHART_KIND => Ok(Self::HelmChart),
            KUSTOMIZE_KIND => Ok(Self::Kustomize),
            other => Err(UnknownKindError(other.to_string())),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an artifact's content comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource<'a> {
    /// Directory in the profile's own repository
    Path(&'a str),
    /// Chart in a remote Helm repository
    Chart(&'a Chart),
    /// Directory in another profile's repository
    Profile(&'a ProfileRef),
}

/// A chart in a remote Helm repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    /// Helm repository URL
    pub url: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

/// Another profile whose repository supplies the artifact content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRef {
    pub url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,

    /// Directory in that repository
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    /// Tag to check out when no branch is given
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

impl ProfileRef {
    /// The branch, or the version tag when no branch is set
    pub fn revision(&self) -> &str {
        if self.branch.is_empty() {
            &self.version
        } else {
            &self.branch
        }
    }
}

/// Request to install a profile into the instance's namespace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInstanceSpec {
    #[serde(rename = "profileURL")]
    pub profile_url: String,

    pub branch: String,

    /// Helm values handed to every release, as given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values_from: Vec<ValuesReference>,
}

impl ResourceSpec for ProfileInstanceSpec {
    const KIND: &'static str = "ProfileInstance";
    const API_VERSION: &'static str = API_VERSION;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileInstanceStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl ResourceStatus for ProfileInstanceStatus {
    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

pub type ProfileDefinition = Object<ProfileDefinitionSpec, NoStatus>;
pub type ProfileInstance = Object<ProfileInstanceSpec, ProfileInstanceStatus>;
