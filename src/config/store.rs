// src/config/store.rs
// =============================================================================
// Reads and writes the settings file.
//
// Location:
// - --config <path> or GITME_CONFIG, when given
// - otherwise the historical fixed path /tmp/gitme-config
//
// The token is stored in plaintext. On Unix the file is written with mode 0600
// so other local users can't read it, and loading a file that is readable by
// group/others logs a warning.
// =============================================================================

use crate::error::{GitmeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "/tmp/gitme-config";

/// The persisted triple. Field names are part of the file format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses `path` when given, otherwise the default location.
    pub fn locate(path: Option<PathBuf>) -> Self {
        Self::new(path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Settings> {
        let data = fs::read(&self.path).map_err(|source| GitmeError::ConfigMissing {
            path: self.path.clone(),
            source,
        })?;

        warn_if_shared(&self.path);

        let settings = serde_json::from_slice(&data).map_err(|source| GitmeError::ConfigInvalid {
            path: self.path.clone(),
            source,
        })?;

        log::debug!("Loaded config from {}", self.path.display());
        Ok(settings)
    }

    /// Replaces whatever was stored before (no merge).
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let write_err = |source: std::io::Error| GitmeError::ConfigWriteError {
            path: self.path.clone(),
            source,
        };

        let json = serde_json::to_vec(settings).map_err(|e| write_err(e.into()))?;

        let mut file = open_private(&self.path).map_err(write_err)?;
        file.write_all(&json).map_err(write_err)?;

        log::debug!("Saved config to {}", self.path.display());
        Ok(())
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation, tighten files left behind by older versions
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(unix)]
fn warn_if_shared(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(meta) = fs::metadata(path) {
        if meta.permissions().mode() & 0o077 != 0 {
            log::warn!(
                "{} is readable by other users and contains your GitHub token, re-run `gitme setup` to restrict it",
                path.display()
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_if_shared(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("gitme-config"));
        let settings = Settings {
            owner: "o".to_string(),
            repo: "r".to_string(),
            token: "t".to_string(),
        };

        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_save_overwrites_previous_content() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("gitme-config"));

        let long = Settings {
            owner: "a-very-long-owner-name".to_string(),
            repo: "a-very-long-repository-name".to_string(),
            token: "a-very-long-token-value".to_string(),
        };
        store.save(&long).unwrap();

        let short = Settings {
            owner: "o".to_string(),
            repo: "r".to_string(),
            token: "t".to_string(),
        };
        store.save(&short).unwrap();

        assert_eq!(store.load().unwrap(), short);
    }

    #[test]
    fn test_file_format_uses_plain_field_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gitme-config");
        fs::write(&path, r#"{"owner":"foo","repo":"bar","token":"secret"}"#).unwrap();

        let settings = ConfigStore::new(&path).load().unwrap();
        assert_eq!(settings.owner, "foo");
        assert_eq!(settings.repo, "bar");
        assert_eq!(settings.token, "secret");
    }

    #[test]
    fn test_missing_file_is_config_missing() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nope"));
        assert!(matches!(store.load(), Err(GitmeError::ConfigMissing { .. })));
    }

    #[test]
    fn test_garbage_file_is_config_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gitme-config");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            ConfigStore::new(&path).load(),
            Err(GitmeError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_unwritable_path_is_write_error() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("missing-dir").join("gitme-config"));
        let result = store.save(&Settings::default());
        assert!(matches!(result, Err(GitmeError::ConfigWriteError { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("gitme-config");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        ConfigStore::new(&path).save(&Settings::default()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
