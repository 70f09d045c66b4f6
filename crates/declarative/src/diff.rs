//! Drift detection between desired and stored objects
//!
//! Only fields the engine owns are compared: `spec` and the owner
//! references. Everything the store manages (uid, version token, generation,
//! timestamps, status) is ignored.

use crate::error::Result;
use crate::meta::ObjectKey;
use crate::object::{Object, ResourceSpec, ResourceStatus};
use crate::store::{ResourceStore, ResourceStoreExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// What converging an object would do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    /// The object is absent and would be created
    Create,
    /// The object has drifted in the listed fields and would be updated
    Update { fields: Vec<String> },
    /// Stored state matches
    InSync,
}

/// A planned change for one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDiff {
    pub key: ObjectKey,
    pub change: Change,
}

impl ResourceDiff {
    /// Compare `desired` with what the store holds, without writing
    pub fn compute<T, S, St>(store: &T, desired: &Object<S, St>) -> Result<Self>
    where
        T: ResourceStore + ?Sized,
        S: ResourceSpec,
        St: ResourceStatus,
    {
        let key = desired.key();
        let change = match store.get::<S, St>(desired.namespace(), desired.name()) {
            Ok(stored) => {
                let fields = drifted_fields(desired, &stored);
                if fields.is_empty() {
                    Change::InSync
                } else {
                    Change::Update { fields }
                }
            }
            Err(e) if e.is_not_found() => Change::Create,
            Err(e) => return Err(e),
        };
        Ok(Self { key, change })
    }

    pub fn is_addition(&self) -> bool {
        matches!(self.change, Change::Create)
    }

    pub fn is_in_sync(&self) -> bool {
        matches!(self.change, Change::InSync)
    }
}

impl fmt::Display for ResourceDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.change {
            Change::Create => write!(f, "create {}", self.key),
            Change::Update { fields } => write!(f, "update {} ({})", self.key, fields.join(", ")),
            Change::InSync => write!(f, "in sync {}", self.key),
        }
    }
}

/// Whether the engine-owned fields of `stored` differ from `desired`
pub fn has_drifted<S, St>(desired: &Object<S, St>, stored: &Object<S, St>) -> bool
where
    S: ResourceSpec,
    St: ResourceStatus,
{
    desired.spec != stored.spec
        || desired.metadata.owner_references != stored.metadata.owner_references
}

/// Names of the engine-owned fields that differ, e.g. `spec.interval`
pub fn drifted_fields<S, St>(desired: &Object<S, St>, stored: &Object<S, St>) -> Vec<String>
where
    S: ResourceSpec,
    St: ResourceStatus,
{
    if !has_drifted(desired, stored) {
        return Vec::new();
    }

    let mut fields = Vec::new();
    if desired.spec != stored.spec {
        let want = serde_json::to_value(&desired.spec).unwrap_or(Value::Null);
        let have = serde_json::to_value(&stored.spec).unwrap_or(Value::Null);
        fields.extend(value_differences("spec", &want, &have));
        if fields.is_empty() {
            fields.push("spec".to_string());
        }
    }
    if desired.metadata.owner_references != stored.metadata.owner_references {
        fields.push("metadata.ownerReferences".to_string());
    }
    fields
}

/// Top-level keys under `prefix` whose values differ
fn value_differences(prefix: &str, want: &Value, have: &Value) -> Vec<String> {
    match (want, have) {
        (Value::Object(want), Value::Object(have)) => {
            let keys: BTreeSet<&String> = want.keys().chain(have.keys()).collect();
            keys.into_iter()
                .filter(|key| want.get(*key) != have.get(*key))
                .map(|key| format!("{prefix}.{key}"))
                .collect()
        }
        _ if want == have => Vec::new(),
        _ => vec![prefix.to_string()],
    }
}

/// Diff summary statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub additions: usize,
    pub modifications: usize,
    pub in_sync: usize,
}

impl DiffSummary {
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            match diff.change {
                Change::Create => summary.additions += 1,
                Change::Update { .. } => summary.modifications += 1,
                Change::InSync => summary.in_sync += 1,
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.modifications
    }

    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}
