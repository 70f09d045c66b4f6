//! In-memory object store
//!
//! A [`ResourceStore`] holding objects in process. It behaves like the shared
//! store the engine talks to in production: it assigns identities and version
//! tokens, enforces optimistic concurrency, keeps status apart from spec
//! writes and garbage-collects dependents when an owner is deleted. It also
//! counts writes and can be told to fail specific operations, which is what
//! tests use it for.

use crate::error::{Result, StoreError};
use crate::meta::ObjectKey;
use crate::store::{ResourceStore, Verb, key_of};
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Number of writes a store has accepted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteCounts {
    pub creates: usize,
    pub updates: usize,
    pub status_patches: usize,
}

impl WriteCounts {
    /// Creates and updates; status patches are not counted
    pub fn spec_writes(&self) -> usize {
        self.creates + self.updates
    }

    pub fn total(&self) -> usize {
        self.creates + self.updates + self.status_patches
    }
}

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<ObjectKey, Value>,
    last_version: u64,
    writes: WriteCounts,
    failures: HashMap<(Verb, String), String>,
}

impl Inner {
    fn next_version(&mut self) -> String {
        self.last_version += 1;
        self.last_version.to_string()
    }

    fn check_failure(&self, verb: Verb, key: &ObjectKey) -> Result<()> {
        match self.failures.get(&(verb, key.kind.clone())) {
            Some(message) => Err(StoreError::unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

/// Object store kept in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from previously stored objects
    ///
    /// Objects keep their metadata as-is; version tokens continue after the
    /// highest numeric token seen.
    pub fn from_objects(objects: impl IntoIterator<Item = Value>) -> Result<Self> {
        let mut inner = Inner::default();
        for object in objects {
            let key = key_of(&object).ok_or_else(|| {
                StoreError::invalid(
                    partial_key(&object),
                    "stored object is missing kind or metadata.name",
                )
            })?;
            let version = object
                .pointer("/metadata/resourceVersion")
                .and_then(Value::as_str)
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or_default();
            inner.last_version = inner.last_version.max(version);
            inner.objects.insert(key, object);
        }
        Ok(Self {
            inner: Mutex::new(inner),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of every stored object, ordered by key
    pub fn objects(&self) -> Vec<Value> {
        self.lock().objects.values().cloned().collect()
    }

    /// Keys of every stored object, ordered
    pub fn keys(&self) -> Vec<ObjectKey> {
        self.lock().objects.keys().cloned().collect()
    }

    /// Keys of stored objects of one kind
    pub fn keys_of_kind(&self, kind: &str) -> Vec<ObjectKey> {
        self.lock()
            .objects
            .keys()
            .filter(|key| key.kind == kind)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().objects.is_empty()
    }

    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.lock().objects.contains_key(key)
    }

    /// Writes accepted since creation or the last [`reset_writes`](Self::reset_writes)
    pub fn writes(&self) -> WriteCounts {
        self.lock().writes
    }

    pub fn reset_writes(&self) {
        self.lock().writes = WriteCounts::default();
    }

    /// Make every `verb` on objects of `kind` fail with `message`
    pub fn fail_on(&self, verb: Verb, kind: &str, message: impl Into<String>) {
        self.lock()
            .failures
            .insert((verb, kind.to_string()), message.into());
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Delete an object and, transitively, every object it owns
    ///
    /// Returns the keys removed, the requested key first.
    pub fn delete(&self, key: &ObjectKey) -> Result<Vec<ObjectKey>> {
        let mut inner = self.lock();
        let removed = inner
            .objects
            .remove(key)
            .ok_or_else(|| StoreError::not_found(key.clone()))?;

        let mut deleted = vec![key.clone()];
        let mut orphaned_uids: Vec<String> = uid_of(&removed).into_iter().collect();

        while let Some(uid) = orphaned_uids.pop() {
            let dependents: Vec<ObjectKey> = inner
                .objects
                .iter()
                .filter(|(_, object)| owner_uids(object).any(|owner| owner == uid))
                .map(|(key, _)| key.clone())
                .collect();

            for dependent in dependents {
                if let Some(object) = inner.objects.remove(&dependent) {
                    log::debug!("garbage collected {dependent}");
                    orphaned_uids.extend(uid_of(&object));
                    deleted.push(dependent);
                }
            }
        }

        Ok(deleted)
    }
}

/// Whatever identity a malformed object carries, empty where absent
fn partial_key(object: &Value) -> ObjectKey {
    let field = |pointer: &str| object.pointer(pointer).and_then(Value::as_str).unwrap_or_default();
    ObjectKey::new(field("/kind"), field("/metadata/namespace"), field("/metadata/name"))
}

impl ResourceStore for MemoryStore {
    fn get_raw(&self, key: &ObjectKey) -> Result<Value> {
        let inner = self.lock();
        inner.check_failure(Verb::Get, key)?;
        inner
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(key.clone()))
    }

    fn create_raw(&self, key: &ObjectKey, mut object: Value) -> Result<Value> {
        let mut inner = self.lock();
        inner.check_failure(Verb::Create, key)?;
        if inner.objects.contains_key(key) {
            return Err(StoreError::AlreadyExists { key: key.clone() });
        }

        let version = inner.next_version();
        let fields = object
            .as_object_mut()
            .ok_or_else(|| StoreError::invalid(key.clone(), "object is not a map"))?;
        fields.remove("status");

        let metadata = metadata_mut(key, fields)?;
        metadata.insert("resourceVersion".into(), Value::String(version));
        metadata.insert("generation".into(), Value::from(1));
        metadata.insert(
            "creationTimestamp".into(),
            serde_json::to_value(Utc::now())
                .map_err(|e| StoreError::invalid(key.clone(), e.to_string()))?,
        );
        let has_uid = metadata
            .get("uid")
            .and_then(Value::as_str)
            .is_some_and(|uid| !uid.is_empty());
        if !has_uid {
            metadata.insert(
                "uid".into(),
                Value::String(uuid::Uuid::new_v4().to_string()),
            );
        }

        inner.objects.insert(key.clone(), object.clone());
        inner.writes.creates += 1;
        Ok(object)
    }

    fn update_raw(&self, key: &ObjectKey, mut object: Value) -> Result<Value> {
        let mut inner = self.lock();
        inner.check_failure(Verb::Update, key)?;
        let stored = inner
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(key.clone()))?;

        let stored_version = stored
            .pointer("/metadata/resourceVersion")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let given_version = object
            .pointer("/metadata/resourceVersion")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if !given_version.is_empty() && given_version != stored_version {
            return Err(StoreError::Conflict {
                key: key.clone(),
                expected: given_version,
                actual: stored_version,
            });
        }

        let spec_changed = stored.get("spec") != object.get("spec");
        let generation = stored
            .pointer("/metadata/generation")
            .and_then(Value::as_i64)
            .unwrap_or(1);
        let version = inner.next_version();

        let fields = object
            .as_object_mut()
            .ok_or_else(|| StoreError::invalid(key.clone(), "object is not a map"))?;
        match stored.get("status") {
            Some(status) => fields.insert("status".into(), status.clone()),
            None => fields.remove("status"),
        };

        let metadata = metadata_mut(key, fields)?;
        for preserved in ["uid", "creationTimestamp"] {
            if let Some(value) = stored.pointer(&format!("/metadata/{preserved}")) {
                metadata.insert(preserved.into(), value.clone());
            }
        }
        metadata.insert("resourceVersion".into(), Value::String(version));
        metadata.insert(
            "generation".into(),
            Value::from(if spec_changed { generation + 1 } else { generation }),
        );

        inner.objects.insert(key.clone(), object.clone());
        inner.writes.updates += 1;
        Ok(object)
    }

    fn patch_status_raw(&self, key: &ObjectKey, status: Value) -> Result<Value> {
        let mut inner = self.lock();
        inner.check_failure(Verb::PatchStatus, key)?;
        if !inner.objects.contains_key(key) {
            return Err(StoreError::not_found(key.clone()));
        }

        let version = inner.next_version();
        let object = inner
            .objects
            .get_mut(key)
            .ok_or_else(|| StoreError::not_found(key.clone()))?;
        let fields = object
            .as_object_mut()
            .ok_or_else(|| StoreError::invalid(key.clone(), "object is not a map"))?;
        fields.insert("status".into(), status);
        metadata_mut(key, fields)?.insert("resourceVersion".into(), Value::String(version));

        let patched = object.clone();
        inner.writes.status_patches += 1;
        Ok(patched)
    }
}

fn metadata_mut<'a>(
    key: &ObjectKey,
    fields: &'a mut Map<String, Value>,
) -> Result<&'a mut Map<String, Value>> {
    fields
        .get_mut("metadata")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| StoreError::invalid(key.clone(), "object has no metadata"))
}

fn uid_of(object: &Value) -> Option<String> {
    object
        .pointer("/metadata/uid")
        .and_then(Value::as_str)
        .filter(|uid| !uid.is_empty())
        .map(str::to_string)
}

fn owner_uids(object: &Value) -> impl Iterator<Item = &str> {
    object
        .pointer("/metadata/ownerReferences")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|owner| owner.get("uid").and_then(Value::as_str))
}
