//! Typed object envelope
//!
//! Every kind is an [`Object`] parameterised by its spec and status. The spec
//! type names the kind; the status type exposes the conditions the kind
//! reports, so callers can read readiness without knowing which kind they
//! hold.

use crate::meta::{Condition, ObjectKey, ObjectMeta, READY, TypeMeta, find_condition};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Desired-state payload of a kind
pub trait ResourceSpec:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Kind name, e.g. "GitRepository"
    const KIND: &'static str;

    /// Group and version, e.g. "source.toolkit.fluxcd.io/v1beta1"
    const API_VERSION: &'static str;
}

/// Observed-state payload of a kind
pub trait ResourceStatus:
    Clone + Default + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Conditions reported by the kind's own controller
    fn conditions(&self) -> &[Condition];
}

/// Status of kinds that report nothing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoStatus {}

impl ResourceStatus for NoStatus {
    fn conditions(&self) -> &[Condition] {
        &[]
    }
}

/// A stored object: type header, metadata, spec and status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "S: Serialize, St: Serialize",
    deserialize = "S: DeserializeOwned, St: DeserializeOwned + Default"
))]
pub struct Object<S, St = NoStatus> {
    #[serde(flatten)]
    pub types: TypeMeta,

    pub metadata: ObjectMeta,

    pub spec: S,

    #[serde(default)]
    pub status: St,
}

impl<S: ResourceSpec, St: ResourceStatus> Object<S, St> {
    /// Create a desired object with an empty status
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, spec: S) -> Self {
        Self {
            types: TypeMeta::new(S::API_VERSION, S::KIND),
            metadata: ObjectMeta::new(name, namespace),
            spec,
            status: St::default(),
        }
    }

    pub fn kind(&self) -> &'static str {
        S::KIND
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(S::KIND, &self.metadata.namespace, &self.metadata.name)
    }

    /// The `Ready` condition from this object's status, if reported
    pub fn ready_condition(&self) -> Option<&Condition> {
        find_condition(self.status.conditions(), READY)
    }
}
