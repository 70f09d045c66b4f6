pub mod delete;
pub mod diff;
pub mod reconcile;
pub mod render;
pub mod status;

use crate::Context;
use crate::state;
use anyhow::Result;
use apis::{ProfileInstance, ProfileInstanceSpec, ProfileInstanceStatus};
use declarative::{MemoryStore, ResourceStoreExt};
use std::path::PathBuf;

/// The local store and where it is persisted
pub struct State {
    pub store: MemoryStore,
    pub path: PathBuf,
}

impl State {
    pub fn open(ctx: &Context) -> Result<Self> {
        let path = ctx.config.state_path()?;
        let store = state::open_store(&path)?;
        Ok(Self { store, path })
    }

    pub fn save(&self) -> Result<()> {
        state::save_store(&self.store, &self.path)
    }
}

/// The stored instance carrying the manifest's spec, or the manifest's copy
/// when it was never stored
pub fn resolve_instance(store: &MemoryStore, manifest: ProfileInstance) -> Result<ProfileInstance> {
    match store.get::<ProfileInstanceSpec, ProfileInstanceStatus>(manifest.namespace(), manifest.name()) {
        Ok(stored) => Ok(ProfileInstance {
            spec: manifest.spec,
            ..stored
        }),
        Err(e) if e.is_not_found() => Ok(manifest),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use apis::{
        Artifact, Chart, ProfileDefinition, ProfileDefinitionSpec, ProfileInstance,
        ProfileInstanceSpec,
    };

    pub fn definition() -> ProfileDefinition {
        let artifact = |name: &str, kind: &str, path: &str| Artifact {
            name: name.into(),
            kind: kind.into(),
            path: path.into(),
            ..Artifact::default()
        };
        ProfileDefinition::new(
            "nginx",
            "",
            ProfileDefinitionSpec {
                description: "nginx with a dashboard".into(),
                artifacts: vec![
                    artifact("server", "HelmChart", "nginx/chart"),
                    artifact("dashboard", "Kustomize", "dashboard"),
                    Artifact {
                        name: "redis".into(),
                        kind: "HelmChart".into(),
                        chart: Some(Chart {
                            url: "https://charts.bitnami.com/bitnami".into(),
                            name: "redis".into(),
                            version: "14.0.0".into(),
                        }),
                        ..Artifact::default()
                    },
                ],
            },
        )
    }

    pub fn instance() -> ProfileInstance {
        ProfileInstance::new(
            "my-nginx",
            "default",
            ProfileInstanceSpec {
                profile_url: "https://github.com/org/nginx-profile".into(),
                branch: "main".into(),
                values: None,
                values_from: Vec::new(),
            },
        )
    }
}
