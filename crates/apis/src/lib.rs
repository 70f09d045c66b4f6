//! # Apis
//!
//! Object kinds read and written by the profile engine.
//!
//! - [`ProfileDefinition`] and [`ProfileInstance`]: the profile API
//! - [`GitRepository`] and [`HelmRepository`]: sources
//! - [`HelmRelease`] and [`Kustomization`]: workloads sourced from them
//!
//! [`scheme`] returns a [`Scheme`](declarative::Scheme) with every kind
//! registered.

pub mod helm;
pub mod interval;
pub mod kustomize;
pub mod profile;
pub mod source;

pub use helm::{
    CrossNamespaceObjectReference, HelmChartTemplate, HelmChartTemplateSpec, HelmRelease,
    HelmReleaseSpec, HelmReleaseStatus, ValuesReference,
};
pub use interval::{Interval, ParseIntervalError};
pub use kustomize::{
    CrossNamespaceSourceReference, Kustomization, KustomizationSpec, KustomizationStatus,
};
pub use profile::{
    Artifact, ArtifactKind, ArtifactSource, Chart, ProfileDefinition, ProfileDefinitionSpec,
    ProfileInstance, ProfileInstanceSpec, ProfileInstanceStatus, ProfileRef, UnknownKindError,
    ValidationError,
};
pub use source::{
    GitRepository, GitRepositoryRef, GitRepositorySpec, HelmRepository, HelmRepositorySpec,
    SourceStatus,
};

use declarative::Scheme;

/// A scheme with the profile kinds and every child kind registered
pub fn scheme() -> Scheme {
    Scheme::new()
        .with::<ProfileDefinitionSpec>()
        .with::<ProfileInstanceSpec>()
        .with::<GitRepositorySpec>()
        .with::<HelmRepositorySpec>()
        .with::<HelmReleaseSpec>()
        .with::<KustomizationSpec>()
}
