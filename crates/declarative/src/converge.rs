//! Create-or-update convergence
//!
//! [`converge`] drives one stored object toward a desired object: create it
//! when absent, overwrite the engine-owned fields when they drifted, and do
//! nothing otherwise. A second call with the same input issues no write.

use crate::diff::has_drifted;
use crate::error::StoreError;
use crate::meta::ObjectKey;
use crate::object::{Object, ResourceSpec, ResourceStatus};
use crate::store::{ResourceStore, ResourceStoreExt, Verb, decode, encode};
use crate::types::ApplyResult;
use serde_json::{Map, Value};
use thiserror::Error;

/// A store call that failed while converging an object
#[derive(Debug, Error)]
#[error("failed to {verb} {}: {source}", .key.kind)]
pub struct ConvergeError {
    pub verb: Verb,
    pub key: ObjectKey,
    #[source]
    pub source: StoreError,
}

impl ConvergeError {
    fn new(verb: Verb, key: ObjectKey, source: StoreError) -> Self {
        Self { verb, key, source }
    }
}

/// Converge the stored copy of `desired`
///
/// Drift is judged on `spec` and the owner references. On drift the stored
/// object keeps its identity and version token, so an update racing another
/// writer fails with a conflict instead of overwriting.
pub fn converge<T, S, St>(store: &T, desired: &Object<S, St>) -> Result<ApplyResult, ConvergeError>
where
    T: ResourceStore + ?Sized,
    S: ResourceSpec,
    St: ResourceStatus,
{
    let key = desired.key();
    let raw = match store.get_raw(&key) {
        Ok(raw) => raw,
        Err(e) if e.is_not_found() => {
            store
                .create(desired)
                .map_err(|e| ConvergeError::new(Verb::Create, key.clone(), e))?;
            log::info!("created {key}");
            return Ok(ApplyResult::Created);
        }
        Err(e) => return Err(ConvergeError::new(Verb::Get, key, e)),
    };
    let stored: Object<S, St> =
        decode(&key, raw.clone()).map_err(|e| ConvergeError::new(Verb::Get, key.clone(), e))?;

    if !has_drifted(desired, &stored) {
        log::debug!("{key} is in sync");
        return Ok(ApplyResult::NoChange);
    }

    let updated = overwrite_owned_fields(&key, raw, desired)
        .map_err(|e| ConvergeError::new(Verb::Update, key.clone(), e))?;
    store
        .update_raw(&key, updated)
        .map_err(|e| ConvergeError::new(Verb::Update, key.clone(), e))?;
    log::info!("updated {key}");
    Ok(ApplyResult::Modified)
}

/// Replace `spec` and the owner references of a stored object
///
/// Everything else the store holds, including fields this crate does not
/// model, is written back untouched.
fn overwrite_owned_fields<S, St>(
    key: &ObjectKey,
    mut stored: Value,
    desired: &Object<S, St>,
) -> Result<Value, StoreError>
where
    S: ResourceSpec,
    St: ResourceStatus,
{
    let spec = encode(key, &desired.spec)?;
    let owners = encode(key, &desired.metadata.owner_references)?;

    let fields = stored
        .as_object_mut()
        .ok_or_else(|| StoreError::invalid(key.clone(), "object is not a map"))?;
    fields.insert("spec".into(), spec);

    let metadata = fields
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| StoreError::invalid(key.clone(), "metadata is not a map"))?;
    if desired.metadata.owner_references.is_empty() {
        metadata.remove("ownerReferences");
    } else {
        metadata.insert("ownerReferences".into(), owners);
    }
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::object::NoStatus;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct PipeSpec {
        path: String,
    }

    impl ResourceSpec for PipeSpec {
        const KIND: &'static str = "Pipe";
        const API_VERSION: &'static str = "test.example/v1";
    }

    type Pipe = Object<PipeSpec, NoStatus>;

    fn pipe(path: &str) -> Pipe {
        Pipe::new("p", "default", PipeSpec { path: path.into() })
    }

    #[test]
    fn test_creates_when_absent() {
        let store = MemoryStore::new();
        assert_eq!(converge(&store, &pipe("a")).unwrap(), ApplyResult::Created);
        assert_eq!(store.writes().creates, 1);
    }

    #[test]
    fn test_second_pass_writes_nothing() {
        let store = MemoryStore::new();
        converge(&store, &pipe("a")).unwrap();
        store.reset_writes();

        assert_eq!(converge(&store, &pipe("a")).unwrap(), ApplyResult::NoChange);
        assert_eq!(store.writes().total(), 0);
    }

    #[test]
    fn test_restores_drifted_spec_keeping_identity() {
        let store = MemoryStore::new();
        converge(&store, &pipe("a")).unwrap();
        let original: Pipe = store.get("default", "p").unwrap();

        let mut tampered = original.clone();
        tampered.spec.path = "new/path".into();
        store.update(&tampered).unwrap();

        assert_eq!(converge(&store, &pipe("a")).unwrap(), ApplyResult::Modified);
        let restored: Pipe = store.get("default", "p").unwrap();
        assert_eq!(restored.spec.path, "a");
        assert_eq!(restored.metadata.uid, original.metadata.uid);
    }

    #[test]
    fn test_update_keeps_fields_it_does_not_own() {
        let store = MemoryStore::new();
        converge(&store, &pipe("a")).unwrap();
        let key = pipe("a").key();

        let mut stored = store.get_raw(&key).unwrap();
        stored["metadata"]["labels"] = serde_json::json!({ "team": "a" });
        stored["metadata"]["finalizers"] = serde_json::json!(["pipes.example/cleanup"]);
        stored["metadata"]["x-unmodelled"] = serde_json::json!("kept");
        stored["spec"]["path"] = serde_json::json!("new/path");
        store.update_raw(&key, stored).unwrap();

        assert_eq!(converge(&store, &pipe("a")).unwrap(), ApplyResult::Modified);
        let restored = store.get_raw(&key).unwrap();
        assert_eq!(restored["spec"]["path"], "a");
        assert_eq!(restored["metadata"]["labels"]["team"], "a");
        assert_eq!(restored["metadata"]["finalizers"][0], "pipes.example/cleanup");
        assert_eq!(restored["metadata"]["x-unmodelled"], "kept");
    }

    #[test]
    fn test_create_failure_names_kind() {
        let store = MemoryStore::new();
        store.fail_on(Verb::Create, "Pipe", "quota exceeded");

        let err = converge(&store, &pipe("a")).unwrap_err();
        assert_eq!(err.verb, Verb::Create);
        assert_eq!(
            err.to_string(),
            "failed to create Pipe: store unavailable: quota exceeded"
        );
    }

    #[test]
    fn test_get_failure_is_not_treated_as_absent() {
        let store = MemoryStore::new();
        store.fail_on(Verb::Get, "Pipe", "timeout");

        let err = converge(&store, &pipe("a")).unwrap_err();
        assert_eq!(err.verb, Verb::Get);
        assert_eq!(store.writes().total(), 0);
    }
}
