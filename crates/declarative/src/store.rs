//! Store capability
//!
//! [`ResourceStore`] is the narrow, object-safe interface to the shared
//! object store: get, create, update and status patch by key, on the JSON
//! wire shape. [`ResourceStoreExt`] layers typed access on top so callers work
//! with [`Object`] values.

use crate::error::{Result, StoreError};
use crate::meta::ObjectKey;
use crate::object::{Object, ResourceSpec, ResourceStatus};
use serde_json::Value;
use std::fmt;

/// Operation issued against a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Create,
    Update,
    PatchStatus,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::PatchStatus => write!(f, "patch status of"),
        }
    }
}

/// Raw access to a shared object store
///
/// Implementations must:
/// - return [`StoreError::NotFound`] for missing keys and nothing else for them
/// - reject `update_raw` with [`StoreError::Conflict`] when the object's
///   `metadata.resourceVersion` is set and stale
/// - own `uid`, `resourceVersion`, `generation` and `creationTimestamp`
/// - ignore `status` on create and update; only `patch_status_raw` writes it
pub trait ResourceStore: Send + Sync {
    /// Fetch the object stored under `key`
    fn get_raw(&self, key: &ObjectKey) -> Result<Value>;

    /// Store a new object, returning it as stored
    fn create_raw(&self, key: &ObjectKey, object: Value) -> Result<Value>;

    /// Replace an existing object, returning it as stored
    fn update_raw(&self, key: &ObjectKey, object: Value) -> Result<Value>;

    /// Replace the status of an existing object, returning it as stored
    fn patch_status_raw(&self, key: &ObjectKey, status: Value) -> Result<Value>;
}

/// Typed access to any [`ResourceStore`]
pub trait ResourceStoreExt {
    /// Fetch an object of kind `S` by namespaced name
    fn get<S: ResourceSpec, St: ResourceStatus>(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Object<S, St>>;

    /// Create `object`, returning the stored copy
    fn create<S: ResourceSpec, St: ResourceStatus>(
        &self,
        object: &Object<S, St>,
    ) -> Result<Object<S, St>>;

    /// Update `object`, returning the stored copy
    fn update<S: ResourceSpec, St: ResourceStatus>(
        &self,
        object: &Object<S, St>,
    ) -> Result<Object<S, St>>;

    /// Persist `object.status`, returning the stored copy
    fn patch_status<S: ResourceSpec, St: ResourceStatus>(
        &self,
        object: &Object<S, St>,
    ) -> Result<Object<S, St>>;
}

impl<T: ResourceStore + ?Sized> ResourceStoreExt for T {
    fn get<S: ResourceSpec, St: ResourceStatus>(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Object<S, St>> {
        let key = ObjectKey::new(S::KIND, namespace, name);
        let value = self.get_raw(&key)?;
        decode(&key, value)
    }

    fn create<S: ResourceSpec, St: ResourceStatus>(
        &self,
        object: &Object<S, St>,
    ) -> Result<Object<S, St>> {
        let key = object.key();
        let value = encode(&key, object)?;
        decode(&key, self.create_raw(&key, value)?)
    }

    fn update<S: ResourceSpec, St: ResourceStatus>(
        &self,
        object: &Object<S, St>,
    ) -> Result<Object<S, St>> {
        let key = object.key();
        let value = encode(&key, object)?;
        decode(&key, self.update_raw(&key, value)?)
    }

    fn patch_status<S: ResourceSpec, St: ResourceStatus>(
        &self,
        object: &Object<S, St>,
    ) -> Result<Object<S, St>> {
        let key = object.key();
        let status = encode(&key, &object.status)?;
        decode(&key, self.patch_status_raw(&key, status)?)
    }
}

pub(crate) fn encode<T: serde::Serialize>(key: &ObjectKey, value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| StoreError::invalid(key.clone(), e.to_string()))
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(key: &ObjectKey, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| StoreError::invalid(key.clone(), e.to_string()))
}

/// Read the store key out of an object on the wire
pub fn key_of(value: &Value) -> Option<ObjectKey> {
    let kind = value.get("kind")?.as_str()?;
    let metadata = value.get("metadata")?;
    let name = metadata.get("name")?.as_str()?;
    let namespace = metadata
        .get("namespace")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(ObjectKey::new(kind, namespace, name))
}
