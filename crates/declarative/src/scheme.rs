//! Kind registry
//!
//! A [`Scheme`] maps kind names to the API version they are served under.
//! Building an owner reference or writing an object of a kind that was never
//! registered fails with [`SchemeError::Unregistered`].

use crate::meta::TypeMeta;
use crate::object::ResourceSpec;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemeError {
    #[error("no kind is registered for the type {kind} in scheme")]
    Unregistered { kind: String },
}

/// Registered kinds and their API versions
#[derive(Debug, Clone, Default)]
pub struct Scheme {
    kinds: BTreeMap<&'static str, &'static str>,
}

impl Scheme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the kind named by `S`
    pub fn register<S: ResourceSpec>(&mut self) -> &mut Self {
        self.kinds.insert(S::KIND, S::API_VERSION);
        self
    }

    /// Builder form of [`register`](Self::register)
    #[must_use]
    pub fn with<S: ResourceSpec>(mut self) -> Self {
        self.register::<S>();
        self
    }

    /// API version and kind for `S`, if registered
    pub fn type_meta<S: ResourceSpec>(&self) -> Result<TypeMeta, SchemeError> {
        self.type_meta_of(S::KIND)
    }

    /// API version and kind for a kind name, if registered
    pub fn type_meta_of(&self, kind: &str) -> Result<TypeMeta, SchemeError> {
        self.kinds
            .get_key_value(kind)
            .map(|(kind, api_version)| TypeMeta::new(*api_version, *kind))
            .ok_or_else(|| SchemeError::Unregistered {
                kind: kind.to_string(),
            })
    }

    /// Registered kind names, sorted
    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.keys().copied()
    }
}
