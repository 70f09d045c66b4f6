//! # Profile
//!
//! Translates a profile instance into the objects that install it, and keeps
//! those objects converged.
//!
//! A pass runs in four steps:
//! - **build**: expand the definition's artifacts into child objects
//!   ([`builder`])
//! - **own**: link every child to the instance ([`ownership`])
//! - **reconcile**: create or update each child in the store ([`reconcile`])
//! - **aggregate**: fold the children's readiness into one condition
//!   ([`status`])
//!
//! [`Profile`] bundles these steps for one definition and instance;
//! [`InstanceReconciler`] drives a whole pass, including writing the
//! instance's status.
//!
//! ## Example
//!
//! ```ignore
//! use declarative::MemoryStore;
//! use profile::Profile;
//!
//! let store = MemoryStore::new();
//! let profile = Profile::new(definition, instance, &store);
//!
//! let summary = profile.reconcile_artifacts()?;
//! let status = profile.artifact_status()?;
//! println!("{} created, ready: {}", summary.created, status.is_ready());
//! ```

pub mod builder;
pub mod child;
pub mod controller;
mod error;
pub mod ownership;
pub mod reconcile;
pub mod status;

pub use builder::BuildOptions;
pub use child::{ChildObject, Observed};
pub use controller::{DefinitionSource, FixedDefinition, InstanceReconciler, PassOutcome};
pub use error::{BoxError, Error, Result};
pub use status::ArtifactStatus;

use apis::{ProfileDefinition, ProfileInstance};
use declarative::{ReconcileSummary, ResourceDiff, ResourceStore, Scheme};

/// One profile definition applied to one instance
pub struct Profile<'a, T: ?Sized> {
    definition: ProfileDefinition,
    instance: ProfileInstance,
    store: &'a T,
    scheme: Scheme,
    options: BuildOptions,
}

impl<'a, T: ResourceStore + ?Sized> Profile<'a, T> {
    /// Create a profile with every kind registered and default build options
    pub fn new(definition: ProfileDefinition, instance: ProfileInstance, store: &'a T) -> Self {
        Self {
            definition,
            instance,
            store,
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

    pub fn definition(&self) -> &ProfileDefinition {
        &self.definition
    }

    pub fn instance(&self) -> &ProfileInstance {
        &self.instance
    }

    /// Build the children without owner references
    pub fn make_ownerless_artifacts(&self) -> Result<Vec<ChildObject>> {
        builder::build(&self.definition, &self.instance, &self.options)
    }

    /// Build the children, each owned by the instance
    pub fn make_artifacts(&self) -> Result<Vec<ChildObject>> {
        let mut children = self.make_ownerless_artifacts()?;
        ownership::set_owner(&self.scheme, &self.instance, &mut children)?;
        Ok(children)
    }

    /// Create or update every child in the store
    pub fn reconcile_artifacts(&self) -> Result<ReconcileSummary> {
        let children = self.make_artifacts()?;
        reconcile::reconcile_children(self.store, &children)
    }

    /// What [`reconcile_artifacts`](Self::reconcile_artifacts) would change
    pub fn plan_artifacts(&self) -> Result<Vec<ResourceDiff>> {
        let children = self.make_artifacts()?;
        reconcile::plan_children(self.store, &children)
    }

    /// Readiness of the children currently built for this instance
    pub fn artifact_status(&self) -> Result<ArtifactStatus> {
        let children = self.make_ownerless_artifacts()?;
        status::artifact_status(self.store, &children)
    }
}
