use anyhow::{Context, Result};
use profile::BuildOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.config/profiles)
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("profiles"))
}

/// Get the state directory path (~/.local/state/profiles)
pub fn state_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".local").join("state").join("profiles"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where stored objects are kept between runs
    pub state_file: Option<String>,

    /// Namespace for instances whose manifest names none
    pub namespace: String,

    pub build: BuildOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_file: None,
            namespace: "default".to_string(),
            build: BuildOptions::default(),
        }
    }
}

impl Config {
    /// Load the config at `path`, or the default location
    ///
    /// A missing file at the default location yields defaults; an explicitly
    /// given file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (config_dir()?.join("config.toml"), false),
        };

        if !explicit && !path.exists() {
            log::debug!("Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config format: {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get the state file path, with `~` expanded
    pub fn state_path(&self) -> Result<PathBuf> {
        match &self.state_file {
            Some(file) => Ok(PathBuf::from(shellexpand::tilde(file).as_ref())),
            None => Ok(state_dir()?.join("state.json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apis::Interval;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.namespace, "default");
        assert!(config.build.prune);
        assert_eq!(config.build.kustomization_interval.to_string(), "5m0s");
        assert!(config.state_path().unwrap().ends_with("profiles/state.json"));
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
namespace = "flux-system"
state_file = "/var/lib/profiles/state.json"

[build]
kustomization_interval = "10m"
prune = false
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.namespace, "flux-system");
        assert_eq!(
            config.state_path().unwrap(),
            PathBuf::from("/var/lib/profiles/state.json")
        );
        assert_eq!(config.build.kustomization_interval, Interval::from_mins(10));
        assert!(!config.build.prune);
        assert_eq!(config.build.source_interval, Interval::from_mins(1));
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("Could not read"));
    }

    #[test]
    fn test_invalid_interval_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[build]\nsource_interval = \"soon\"\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_tilde_is_expanded() {
        let config = Config {
            state_file: Some("~/profiles.json".into()),
            ..Config::default()
        };
        let path = config.state_path().unwrap();
        assert!(!path.starts_with("~"));
        assert!(path.ends_with("profiles.json"));
    }
}
