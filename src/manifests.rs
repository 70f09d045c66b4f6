//! Reading profile manifests from disk

use anyhow::{Context, Result, bail};
use apis::{ProfileDefinition, ProfileInstance};
use declarative::{Object, ResourceSpec, ResourceStatus};
use profile::{BoxError, DefinitionSource};
use std::fs;
use std::path::{Path, PathBuf};

/// Parse a YAML or JSON manifest of kind `S::KIND`
fn load<S, St>(path: &Path) -> Result<Object<S, St>>
where
    S: ResourceSpec,
    St: ResourceStatus,
{
    let content =
        fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;
    let object: Object<S, St> = serde_yaml::from_str(&content)
        .with_context(|| format!("Invalid {} manifest: {}", S::KIND, path.display()))?;

    if object.types.kind != S::KIND {
        bail!(
            "{} holds a {:?}, expected {}",
            path.display(),
            object.types.kind,
            S::KIND
        );
    }
    Ok(object)
}

pub fn load_definition(path: &Path) -> Result<ProfileDefinition> {
    load(path)
}

/// Load an instance, placing it in `namespace` when the manifest names none
pub fn load_instance(path: &Path, namespace: &str) -> Result<ProfileInstance> {
    let mut instance: ProfileInstance = load(path)?;
    if instance.metadata.namespace.is_empty() {
        instance.metadata.namespace = namespace.to_string();
    }
    Ok(instance)
}

/// Serves the definition kept in one manifest file, read on every fetch
#[derive(Debug, Clone)]
pub struct DefinitionFile(pub PathBuf);

impl DefinitionSource for DefinitionFile {
    fn fetch(&self, url: &str, branch: &str) -> std::result::Result<ProfileDefinition, BoxError> {
        log::debug!("fetching definition for {url}@{branch} from {}", self.0.display());
        Ok(load_definition(&self.0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DEFINITION: &str = r#"
apiVersion: weave.works/v1alpha1
kind: ProfileDefinition
metadata:
  name: nginx
spec:
  description: nginx with a dashboard
  artifacts:
    - name: nginx-server
      kind: HelmChart
      path: nginx/chart
    - name: dashboard
      kind: Kustomize
      path: dashboard
"#;

    const INSTANCE: &str = r#"
apiVersion: weave.works/v1alpha1
kind: ProfileInstance
metadata:
  name: my-nginx
spec:
  profileURL: https://github.com/org/nginx-profile
  branch: main
  values:
    replicaCount: 3
"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_definition() {
        let dir = TempDir::new().unwrap();
        let definition = load_definition(&write(&dir, "def.yaml", DEFINITION)).unwrap();
        assert_eq!(definition.name(), "nginx");
        assert_eq!(definition.spec.artifacts.len(), 2);
        assert_eq!(definition.spec.artifacts[0].path, "nginx/chart");
    }

    #[test]
    fn test_instance_gets_default_namespace() {
        let dir = TempDir::new().unwrap();
        let instance = load_instance(&write(&dir, "inst.yaml", INSTANCE), "flux-system").unwrap();
        assert_eq!(instance.namespace(), "flux-system");
        assert_eq!(instance.spec.profile_url, "https://github.com/org/nginx-profile");
        assert_eq!(
            instance.spec.values,
            Some(serde_json::json!({ "replicaCount": 3 }))
        );
    }

    #[test]
    fn test_json_manifest_is_accepted() {
        let dir = TempDir::new().unwrap();
        let json = r#"{"apiVersion": "weave.works/v1alpha1", "kind": "ProfileInstance",
            "metadata": {"name": "a", "namespace": "team"},
            "spec": {"profileURL": "https://github.com/org/p", "branch": "dev"}}"#;
        let instance = load_instance(&write(&dir, "inst.json", json), "default").unwrap();
        assert_eq!(instance.namespace(), "team");
        assert_eq!(instance.spec.branch, "dev");
    }

    #[test]
    fn test_wrong_kind_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = load_definition(&write(&dir, "inst.yaml", INSTANCE)).unwrap_err();
        assert!(err.to_string().contains("expected ProfileDefinition"));

        let broken = DEFINITION.replace("  name: nginx\n", "");
        let err = load_definition(&write(&dir, "def.yaml", &broken)).unwrap_err();
        assert!(err.to_string().contains("Invalid ProfileDefinition manifest"));
    }

    #[test]
    fn test_definition_file_source() {
        let dir = TempDir::new().unwrap();
        let source = DefinitionFile(write(&dir, "def.yaml", DEFINITION));
        let definition = source.fetch("https://github.com/org/nginx-profile", "main").unwrap();
        assert_eq!(definition.name(), "nginx");

        let missing = DefinitionFile(dir.path().join("missing.yaml"));
        assert!(missing.fetch("u", "b").is_err());
    }
}
