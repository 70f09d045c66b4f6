//! # Declarative
//!
//! Primitives for converging objects in a shared declarative store.
//!
//! A caller describes the objects it wants as typed [`Object`] values and
//! hands them to [`converge`], which creates what is missing and updates what
//! drifted. Readiness is read back from the conditions each kind reports.
//!
//! ## Core Concepts
//!
//! - **Object**: type header, metadata, spec and status of one stored record
//! - **ResourceStore**: the narrow get/create/update/patch-status capability
//! - **Scheme**: the registry of kinds an engine may own or write
//! - **ResourceDiff**: what converging an object would change, without writing
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{converge, MemoryStore, Object, ApplyResult};
//!
//! let store = MemoryStore::new();
//! let desired = Object::<MySpec>::new("name", "default", spec);
//!
//! assert_eq!(converge(&store, &desired)?, ApplyResult::Created);
//! assert_eq!(converge(&store, &desired)?, ApplyResult::NoChange);
//! ```
//!
//! ## Provider Traits
//!
//! Store access is injected through [`ResourceStore`], so engines built on
//! this crate run unchanged against [`MemoryStore`] in tests and against a
//! remote backend in production.

pub mod converge;
pub mod diff;
pub mod error;
pub mod memory;
pub mod meta;
pub mod object;
pub mod scheme;
pub mod store;
pub mod types;

// Re-export main types at crate root
pub use converge::{ConvergeError, converge};
pub use diff::{Change, DiffSummary, ResourceDiff, drifted_fields, has_drifted};
pub use error::{ErrorCategory, Result, StoreError};
pub use memory::{MemoryStore, WriteCounts};
pub use meta::{
    Condition, ConditionStatus, ObjectKey, ObjectMeta, OwnerReference, READY, TypeMeta,
    find_condition,
};
pub use object::{NoStatus, Object, ResourceSpec, ResourceStatus};
pub use scheme::{Scheme, SchemeError};
pub use store::{ResourceStore, ResourceStoreExt, Verb, key_of};
pub use types::{ApplyResult, ReconcileSummary};
