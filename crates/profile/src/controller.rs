//! Reconciliation pass for one profile instance
//!
//! The scheduler decides when to run a pass and guarantees that passes for the
//! same instance never overlap. A pass fetches the instance and its
//! definition, converges the children, aggregates their readiness and writes
//! a single `Ready` condition back onto the instance.

use crate::Profile;
use crate::builder::BuildOptions;
use crate::error::{BoxError, Error, Result};
use crate::status::{REASON_CREATE_FAILED, REASON_FETCH_FAILED};
use apis::{ProfileDefinition, ProfileInstance, ProfileInstanceSpec, ProfileInstanceStatus};
use declarative::{
    Condition, ConditionStatus, READY, ReconcileSummary, ResourceStore, ResourceStoreExt, Scheme,
    Verb, find_condition,
};

/// Retrieves profile definitions by repository URL and branch
pub trait DefinitionSource {
    fn fetch(&self, url: &str, branch: &str) -> std::result::Result<ProfileDefinition, BoxError>;
}

impl<F> DefinitionSource for F
where
    F: Fn(&str, &str) -> std::result::Result<ProfileDefinition, BoxError>,
{
    fn fetch(&self, url: &str, branch: &str) -> std::result::Result<ProfileDefinition, BoxError> {
        self(url, branch)
    }
}

/// A source that serves one definition for every request
#[derive(Debug, Clone)]
pub struct FixedDefinition(pub ProfileDefinition);

impl DefinitionSource for FixedDefinition {
    fn fetch(&self, _url: &str, _branch: &str) -> std::result::Result<ProfileDefinition, BoxError> {
        Ok(self.0.clone())
    }
}

/// Outcome of a successful pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The instance no longer exists; nothing was done
    Deleted,
    /// Children were converged and the instance's status written
    Reconciled {
        summary: ReconcileSummary,
        condition: Condition,
    },
}

/// Runs reconciliation passes against a store
pub struct InstanceReconciler<'a, T: ?Sized, D> {
    store: &'a T,
    definitions: D,
    scheme: Scheme,
    options: BuildOptions,
}

impl<'a, T, D> InstanceReconciler<'a, T, D>
where
    T: ResourceStore + ?Sized,
    D: DefinitionSource,
{
    pub fn new(store: &'a T, definitions: D) -> Self {
        Self {
            store,
            definitions,
            scheme: apis::scheme(),
            options: BuildOptions::default(),
        }
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Run one pass for the instance `namespace/name`
    ///
    /// Failures fetching the definition or converging the children are
    /// recorded as `Ready=False` on the instance before being returned.
    pub fn reconcile(&self, namespace: &str, name: &str) -> Result<PassOutcome> {
        let instance: ProfileInstance = match self.store.get(namespace, name) {
            Ok(instance) => instance,
            Err(e) if e.is_not_found() => {
                log::info!("{namespace}/{name}: resource has been deleted");
                return Ok(PassOutcome::Deleted);
            }
            Err(source) => {
                log::error!("{namespace}/{name}: failed to get resource: {source}");
                return Err(Error::Store {
                    verb: Verb::Get,
                    kind: <ProfileInstanceSpec as declarative::ResourceSpec>::KIND.to_string(),
                    name: name.to_string(),
                    source,
                });
            }
        };

        let spec = &instance.spec;
        let definition = match self.definitions.fetch(&spec.profile_url, &spec.branch) {
            Ok(definition) => definition,
            Err(source) => {
                self.patch_ready(
                    &instance,
                    Condition::ready(
                        ConditionStatus::False,
                        REASON_FETCH_FAILED,
                        "error when fetching profile definition",
                    ),
                )?;
                return Err(Error::Definition {
                    url: spec.profile_url.clone(),
                    branch: spec.branch.clone(),
                    source,
                });
            }
        };

        let profile = Profile::new(definition, instance.clone(), self.store)
            .with_scheme(self.scheme.clone())
            .with_options(self.options.clone());

        let summary = match profile.reconcile_artifacts() {
            Ok(summary) => summary,
            Err(e) => {
                self.patch_ready(
                    &instance,
                    Condition::ready(
                        ConditionStatus::False,
                        REASON_CREATE_FAILED,
                        "error when reconciling profile artifacts",
                    ),
                )?;
                return Err(e);
            }
        };

        let condition = profile.artifact_status()?.ready_condition();
        let condition = self.patch_ready(&instance, condition)?;
        log::info!(
            "{}: Ready={} ({})",
            instance.key(),
            condition.status,
            condition.reason
        );
        Ok(PassOutcome::Reconciled { summary, condition })
    }

    /// Replace the instance's conditions with `condition` on a fresh copy
    ///
    /// The transition time of an unchanged status is kept.
    fn patch_ready(&self, instance: &ProfileInstance, mut condition: Condition) -> Result<Condition> {
        let status_error = |source| Error::StatusPatch {
            name: instance.name().to_string(),
            source,
        };

        let mut latest: ProfileInstance = self
            .store
            .get(instance.namespace(), instance.name())
            .map_err(|e| {
                log::error!("{}: failed to get latest resource during patch: {e}", instance.key());
                status_error(e)
            })?;

        condition.carry_transition_from(find_condition(&latest.status.conditions, READY));
        condition.observed_generation = Some(latest.metadata.generation);
        latest.status = ProfileInstanceStatus {
            conditions: vec![condition.clone()],
        };

        self.store.patch_status(&latest).map_err(|e| {
            log::error!("{}: failed to patch status: {e}", instance.key());
            status_error(e)
        })?;
        Ok(condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tests::{full_definition, instance};
    use apis::{GitRepository, HelmReleaseSpec};
    use chrono::{TimeZone, Utc};
    use declarative::MemoryStore;

    fn store_with_instance() -> MemoryStore {
        let store = MemoryStore::new();
        store.create(&instance()).unwrap();
        store
    }

    fn ready_of(store: &MemoryStore) -> Condition {
        let stored: ProfileInstance = store.get("default", "mySub").unwrap();
        assert_eq!(stored.status.conditions.len(), 1);
        stored.status.conditions[0].clone()
    }

    fn mark_children_ready(store: &MemoryStore) {
        for key in store.keys() {
            if key.kind == "ProfileInstance" {
                continue;
            }
            let condition = Condition::ready(ConditionStatus::True, "Succeeded", "");
            store
                .patch_status_raw(&key, serde_json::json!({ "conditions": [condition] }))
                .unwrap();
        }
    }

    #[test]
    fn test_deleted_instance_is_a_no_op() {
        let store = MemoryStore::new();
        let reconciler = InstanceReconciler::new(&store, FixedDefinition(full_definition()));

        assert_eq!(reconciler.reconcile("default", "mySub").unwrap(), PassOutcome::Deleted);
        assert!(store.is_empty());
    }

    #[test]
    fn test_scenario_two_charts_and_a_kustomization() {
        let definition = crate::builder::tests::definition(vec![
            crate::builder::tests::path_artifact("a", "HelmChart", "charts/a"),
            crate::builder::tests::path_artifact("b", "HelmChart", "charts/b"),
            crate::builder::tests::path_artifact("c", "Kustomize", "deploy/c"),
        ]);
        let store = store_with_instance();
        let owner: ProfileInstance = store.get("default", "mySub").unwrap();
        let reconciler = InstanceReconciler::new(&store, FixedDefinition(definition));

        let PassOutcome::Reconciled { summary, condition } =
            reconciler.reconcile("default", "mySub").unwrap()
        else {
            panic!("instance exists");
        };
        assert_eq!(summary.created, 4);
        assert_eq!(store.keys_of_kind("GitRepository").len(), 1);
        assert_eq!(store.keys_of_kind("HelmRelease").len(), 2);
        assert_eq!(store.keys_of_kind("Kustomization").len(), 1);
        assert_eq!(store.keys_of_kind("HelmRepository").len(), 0);
        for object in store.objects() {
            if object["kind"] == "ProfileInstance" {
                continue;
            }
            let owners = object["metadata"]["ownerReferences"].as_array().unwrap();
            assert_eq!(owners.len(), 1);
            assert_eq!(owners[0]["uid"], owner.metadata.uid.as_str());
            assert_eq!(owners[0]["controller"], true);
        }

        assert_eq!(condition.status, ConditionStatus::Unknown);
        assert_eq!(condition.reason, "ArtifactNotReady");

        store.reset_writes();
        reconciler.reconcile("default", "mySub").unwrap();
        let writes = store.writes();
        assert_eq!(writes.spec_writes(), 0);
        assert_eq!(writes.status_patches, 1);
    }

    #[test]
    fn test_ready_when_all_children_ready() {
        let store = store_with_instance();
        let reconciler = InstanceReconciler::new(&store, FixedDefinition(full_definition()));
        reconciler.reconcile("default", "mySub").unwrap();
        mark_children_ready(&store);

        reconciler.reconcile("default", "mySub").unwrap();
        let ready = ready_of(&store);
        assert_eq!(ready.status, ConditionStatus::True);
        assert_eq!(ready.reason, "ArtifactsReady");
        assert_eq!(ready.message, "all artifact resources ready");
        assert_eq!(ready.observed_generation, Some(1));
    }

    #[test]
    fn test_not_ready_messages_are_joined() {
        let store = store_with_instance();
        let reconciler = InstanceReconciler::new(&store, FixedDefinition(full_definition()));
        reconciler.reconcile("default", "mySub").unwrap();
        mark_children_ready(&store);

        let mut git: GitRepository = store.get("default", "mySub-repo-name-main").unwrap();
        git.status.conditions = vec![Condition::ready(
            ConditionStatus::False,
            "GitOperationFailed",
            "auth failed",
        )];
        store.patch_status(&git).unwrap();
        let key = declarative::ObjectKey::new("Kustomization", "default", "mySub-profileName-kustomizeOne");
        let pending = Condition::ready(ConditionStatus::Unknown, "Progressing", "building");
        store
            .patch_status_raw(&key, serde_json::json!({ "conditions": [pending] }))
            .unwrap();

        reconciler.reconcile("default", "mySub").unwrap();
        let ready = ready_of(&store);
        assert_eq!(ready.status, ConditionStatus::False);
        assert_eq!(ready.reason, "ArtifactNotReady");
        assert_eq!(ready.message, "auth failed,building");
    }

    #[test]
    fn test_fetch_failure_is_recorded() {
        let store = store_with_instance();
        let failing = |_: &str, _: &str| -> std::result::Result<ProfileDefinition, BoxError> {
            Err("repository not found".into())
        };
        let reconciler = InstanceReconciler::new(&store, failing);

        let err = reconciler.reconcile("default", "mySub").unwrap_err();
        assert!(matches!(err, Error::Definition { .. }));
        assert!(err.to_string().ends_with("repository not found"));

        let ready = ready_of(&store);
        assert_eq!(ready.status, ConditionStatus::False);
        assert_eq!(ready.reason, "FetchProfileFailed");
        assert_eq!(ready.message, "error when fetching profile definition");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_failure_is_recorded() {
        let store = store_with_instance();
        let mut definition = full_definition();
        definition.spec.artifacts[0].kind = "SomeUnknownKind".into();
        let reconciler = InstanceReconciler::new(&store, FixedDefinition(definition));

        let err = reconciler.reconcile("default", "mySub").unwrap_err();
        assert_eq!(err.to_string(), "artifact kind \"SomeUnknownKind\" not recognized");

        let ready = ready_of(&store);
        assert_eq!(ready.status, ConditionStatus::False);
        assert_eq!(ready.reason, "CreateFailed");
        assert_eq!(ready.message, "error when reconciling profile artifacts");
    }

    #[test]
    fn test_unregistered_owner_is_recorded() {
        let store = store_with_instance();
        let reconciler = InstanceReconciler::new(&store, FixedDefinition(full_definition()))
            .with_scheme(Scheme::new().with::<HelmReleaseSpec>());

        let err = reconciler.reconcile("default", "mySub").unwrap_err();
        assert!(err.to_string().contains("failed to set resource ownership"));
        assert_eq!(ready_of(&store).reason, "CreateFailed");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_status_patch_failure() {
        let store = store_with_instance();
        store.fail_on(Verb::PatchStatus, "ProfileInstance", "forbidden");
        let reconciler = InstanceReconciler::new(&store, FixedDefinition(full_definition()));

        let err = reconciler.reconcile("default", "mySub").unwrap_err();
        assert!(matches!(err, Error::StatusPatch { .. }));
        assert_eq!(
            err.to_string(),
            "failed to patch status of mySub: store unavailable: forbidden"
        );
    }

    #[test]
    fn test_transition_time_kept_while_status_holds() {
        let store = store_with_instance();
        let reconciler = InstanceReconciler::new(&store, FixedDefinition(full_definition()));
        reconciler.reconcile("default", "mySub").unwrap();

        let earlier = Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap();
        let mut stored: ProfileInstance = store.get("default", "mySub").unwrap();
        stored.status.conditions[0].last_transition_time = earlier;
        store.patch_status(&stored).unwrap();

        reconciler.reconcile("default", "mySub").unwrap();
        assert_eq!(ready_of(&store).last_transition_time, earlier);

        mark_children_ready(&store);
        reconciler.reconcile("default", "mySub").unwrap();
        let ready = ready_of(&store);
        assert_eq!(ready.status, ConditionStatus::True);
        assert_ne!(ready.last_transition_time, earlier);
    }

    #[test]
    fn test_deleting_instance_collects_children() {
        let store = store_with_instance();
        let reconciler = InstanceReconciler::new(&store, FixedDefinition(full_definition()));
        reconciler.reconcile("default", "mySub").unwrap();
        assert_eq!(store.len(), 8);

        let key = declarative::ObjectKey::new("ProfileInstance", "default", "mySub");
        let deleted = store.delete(&key).unwrap();
        assert_eq!(deleted.len(), 8);
        assert!(store.is_empty());
    }
}
