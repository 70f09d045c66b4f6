use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use declarative::MemoryStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Stored objects persisted between runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateFile {
    /// Every stored object in its wire shape
    #[serde(default)]
    pub objects: Vec<Value>,

    /// Last time the state was saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl StateFile {
    /// Load state from disk, or return empty state if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, starting empty");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        let state: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("Loaded {} objects from {}", state.objects.len(), path.display());
        Ok(state)
    }

    /// Save state to disk, stamping `last_updated`
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        self.last_updated = Some(Utc::now());
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize state to JSON")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved {} objects to {}", self.objects.len(), path.display());
        Ok(())
    }

    /// Snapshot every object held by `store`
    pub fn from_store(store: &MemoryStore) -> Self {
        Self {
            objects: store.objects(),
            last_updated: None,
        }
    }

    pub fn into_store(self) -> Result<MemoryStore> {
        MemoryStore::from_objects(self.objects).context("State file holds an invalid object")
    }
}

/// Load the store kept at `path`
pub fn open_store(path: &Path) -> Result<MemoryStore> {
    StateFile::load(path)?.into_store()
}

/// Write every object in `store` back to `path`
pub fn save_store(store: &MemoryStore, path: &Path) -> Result<()> {
    StateFile::from_store(store).save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apis::{ProfileInstance, ProfileInstanceSpec};
    use declarative::ResourceStoreExt;
    use tempfile::TempDir;

    fn instance() -> ProfileInstance {
        ProfileInstance::new(
            "mySub",
            "default",
            ProfileInstanceSpec {
                profile_url: "https://github.com/org/repo-name".into(),
                branch: "main".into(),
                values: None,
                values_from: Vec::new(),
            },
        )
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir.path().join("state.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_survives_a_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = MemoryStore::new();
        let created = store.create(&instance()).unwrap();
        save_store(&store, &path).unwrap();

        let reopened = open_store(&path).unwrap();
        let loaded: ProfileInstance = reopened.get("default", "mySub").unwrap();
        assert_eq!(loaded.metadata.uid, created.metadata.uid);
        assert_eq!(loaded.metadata.resource_version, created.metadata.resource_version);

        // version tokens keep advancing after a reload
        let updated = reopened.update(&loaded).unwrap();
        assert_ne!(updated.metadata.resource_version, created.metadata.resource_version);
    }

    #[test]
    fn test_saved_file_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let store = MemoryStore::new();
        store.create(&instance()).unwrap();
        save_store(&store, &path).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw["lastUpdated"].is_string());
        assert_eq!(raw["objects"][0]["kind"], "ProfileInstance");
        assert_eq!(raw["objects"][0]["spec"]["profileURL"], "https://github.com/org/repo-name");
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        let err = open_store(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse state file"));
    }

    #[test]
    fn test_object_without_name_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"objects": [{"kind": "GitRepository", "metadata": {}}]}"#).unwrap();
        assert!(open_store(&path).is_err());
    }
}
