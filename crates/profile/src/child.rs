//! Child objects built for a profile instance
//!
//! The four child kinds differ in spec and status but are handled uniformly:
//! each can be converged, diffed against the store and observed for its
//! `Ready` condition.

use apis::{GitRepository, HelmRelease, HelmRepository, Kustomization};
use declarative::{
    ApplyResult, Condition, ConvergeError, Object, ObjectKey, ObjectMeta, ResourceDiff,
    ResourceSpec, ResourceStatus, ResourceStore, ResourceStoreExt, converge,
};
use serde::Serialize;

/// One object built from a profile artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChildObject {
    GitRepository(GitRepository),
    HelmRepository(HelmRepository),
    HelmRelease(HelmRelease),
    Kustomization(Kustomization),
}

macro_rules! each_kind {
    ($child:expr, $object:ident => $body:expr) => {
        match $child {
            ChildObject::GitRepository($object) => $body,
            ChildObject::HelmRepository($object) => $body,
            ChildObject::HelmRelease($object) => $body,
            ChildObject::Kustomization($object) => $body,
        }
    };
}

/// What the store holds for a child
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    /// Nothing is stored under the child's name
    Absent,
    /// The child exists; `ready` is its `Ready` condition, if reported
    Present { ready: Option<Condition> },
}

impl ChildObject {
    pub fn kind(&self) -> &'static str {
        each_kind!(self, o => o.kind())
    }

    pub fn name(&self) -> &str {
        each_kind!(self, o => o.name())
    }

    pub fn namespace(&self) -> &str {
        each_kind!(self, o => o.namespace())
    }

    pub fn key(&self) -> ObjectKey {
        each_kind!(self, o => o.key())
    }

    pub fn metadata(&self) -> &ObjectMeta {
        each_kind!(self, o => &o.metadata)
    }

    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        each_kind!(self, o => &mut o.metadata)
    }

    /// Create or update the stored copy
    pub fn converge<T: ResourceStore + ?Sized>(
        &self,
        store: &T,
    ) -> Result<ApplyResult, ConvergeError> {
        each_kind!(self, o => converge(store, o))
    }

    /// What converging would change, without writing
    pub fn diff<T: ResourceStore + ?Sized>(&self, store: &T) -> declarative::Result<ResourceDiff> {
        each_kind!(self, o => ResourceDiff::compute(store, o))
    }

    /// Fetch the stored copy and read its readiness
    pub fn observe<T: ResourceStore + ?Sized>(&self, store: &T) -> declarative::Result<Observed> {
        each_kind!(self, o => observe_object(store, o))
    }
}

fn observe_object<T, S, St>(store: &T, object: &Object<S, St>) -> declarative::Result<Observed>
where
    T: ResourceStore + ?Sized,
    S: ResourceSpec,
    St: ResourceStatus,
{
    match store.get::<S, St>(object.namespace(), object.name()) {
        Ok(stored) => Ok(Observed::Present {
            ready: stored.ready_condition().cloned(),
        }),
        Err(e) if e.is_not_found() => Ok(Observed::Absent),
        Err(e) => Err(e),
    }
}

impl From<GitRepository> for ChildObject {
    fn from(object: GitRepository) -> Self {
        Self::GitRepository(object)
    }
}

impl From<HelmRepository> for ChildObject {
    fn from(object: HelmRepository) -> Self {
        Self::HelmRepository(object)
    }
}

impl From<HelmRelease> for ChildObject {
    fn from(object: HelmRelease) -> Self {
        Self::HelmRelease(object)
    }
}

impl From<Kustomization> for ChildObject {
    fn from(object: Kustomization) -> Self {
        Self::Kustomization(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apis::{GitRepositoryRef, GitRepositorySpec, Interval};
    use declarative::{ConditionStatus, MemoryStore};

    fn git() -> ChildObject {
        GitRepository::new(
            "sub-repo-main",
            "default",
            GitRepositorySpec {
                url: "https://github.com/org/repo".into(),
                reference: Some(GitRepositoryRef::branch("main")),
                interval: Interval::from_mins(1),
            },
        )
        .into()
    }

    #[test]
    fn test_uniform_accessors() {
        let child = git();
        assert_eq!(child.kind(), "GitRepository");
        assert_eq!(child.name(), "sub-repo-main");
        assert_eq!(child.namespace(), "default");
        assert_eq!(
            child.key(),
            ObjectKey::new("GitRepository", "default", "sub-repo-main")
        );
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let value = serde_json::to_value(git()).unwrap();
        assert_eq!(value["kind"], "GitRepository");
        assert_eq!(value["spec"]["reference"]["branch"], "main");
    }

    #[test]
    fn test_observe() {
        let store = MemoryStore::new();
        let child = git();
        assert_eq!(child.observe(&store).unwrap(), Observed::Absent);

        child.converge(&store).unwrap();
        assert_eq!(
            child.observe(&store).unwrap(),
            Observed::Present { ready: None }
        );

        let mut stored: GitRepository = store.get("default", "sub-repo-main").unwrap();
        stored
            .status
            .conditions
            .push(Condition::ready(ConditionStatus::True, "Succeeded", ""));
        store.patch_status(&stored).unwrap();

        match child.observe(&store).unwrap() {
            Observed::Present { ready: Some(ready) } => assert!(ready.is_true()),
            other => panic!("unexpected observation: {other:?}"),
        }
    }
}
