//! Owner linkage from child objects to their instance
//!
//! Every child carries exactly one owner reference, flagged as controller,
//! pointing at the instance it was built for. The store garbage-collects the
//! children when the instance is deleted.

use crate::child::ChildObject;
use crate::error::{Error, Result};
use apis::{ProfileInstance, ProfileInstanceSpec};
use declarative::{OwnerReference, Scheme};

/// Controller reference to `owner`
pub fn controller_reference(scheme: &Scheme, owner: &ProfileInstance) -> Result<OwnerReference> {
    let types = scheme
        .type_meta::<ProfileInstanceSpec>()
        .map_err(Error::Ownership)?;

    Ok(OwnerReference {
        api_version: types.api_version,
        kind: types.kind,
        name: owner.name().to_string(),
        uid: owner.metadata.uid.clone(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    })
}

/// Make `owner` the sole controller of every child
///
/// Fails without touching any child when the owner kind or a child kind is not
/// registered in `scheme`.
pub fn set_owner(scheme: &Scheme, owner: &ProfileInstance, children: &mut [ChildObject]) -> Result<()> {
    let reference = controller_reference(scheme, owner)?;
    for child in children.iter() {
        scheme.type_meta_of(child.kind()).map_err(Error::Ownership)?;
    }

    for child in children.iter_mut() {
        child.metadata_mut().owner_references = vec![reference.clone()];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tests::{full_definition, instance};
    use crate::builder::{BuildOptions, build};
    use apis::{GitRepositorySpec, HelmReleaseSpec, HelmRepositorySpec, KustomizationSpec};

    fn stored_instance() -> ProfileInstance {
        let mut owner = instance();
        owner.metadata.uid = "0f9d6c1e-uid".into();
        owner
    }

    #[test]
    fn test_every_child_gets_one_controller() {
        let owner = stored_instance();
        let mut children = build(&full_definition(), &owner, &BuildOptions::default()).unwrap();
        set_owner(&apis::scheme(), &owner, &mut children).unwrap();

        assert_eq!(children.len(), 7);
        for child in &children {
            let owners = &child.metadata().owner_references;
            assert_eq!(owners.len(), 1, "{}", child.key());
            let reference = &owners[0];
            assert_eq!(reference.name, "mySub");
            assert_eq!(reference.kind, "ProfileInstance");
            assert_eq!(reference.api_version, "weave.works/v1alpha1");
            assert_eq!(reference.uid, "0f9d6c1e-uid");
            assert_eq!(reference.controller, Some(true));
            assert_eq!(child.metadata().controller(), Some(reference));
        }
    }

    #[test]
    fn test_setting_owner_twice_keeps_one_reference() {
        let owner = stored_instance();
        let mut children = build(&full_definition(), &owner, &BuildOptions::default()).unwrap();
        set_owner(&apis::scheme(), &owner, &mut children).unwrap();
        set_owner(&apis::scheme(), &owner, &mut children).unwrap();
        assert!(children.iter().all(|c| c.metadata().owner_references.len() == 1));
    }

    #[test]
    fn test_unregistered_owner_fails() {
        let owner = stored_instance();
        let scheme = Scheme::new().with::<HelmReleaseSpec>();
        let mut children = build(&full_definition(), &owner, &BuildOptions::default()).unwrap();

        let err = set_owner(&scheme, &owner, &mut children).unwrap_err();
        assert!(matches!(err, Error::Ownership(_)));
        assert!(err.to_string().contains("failed to set resource ownership"));
        assert!(children.iter().all(|c| c.metadata().owner_references.is_empty()));
    }

    #[test]
    fn test_unregistered_child_kind_fails() {
        let owner = stored_instance();
        let scheme = Scheme::new()
            .with::<ProfileInstanceSpec>()
            .with::<GitRepositorySpec>()
            .with::<HelmRepositorySpec>()
            .with::<HelmReleaseSpec>();
        let mut children = build(&full_definition(), &owner, &BuildOptions::default()).unwrap();

        let err = set_owner(&scheme, &owner, &mut children).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to set resource ownership: no kind is registered for the type Kustomization in scheme"
        );

        let scheme = scheme.with::<KustomizationSpec>();
        assert!(set_owner(&scheme, &owner, &mut children).is_ok());
    }
}
