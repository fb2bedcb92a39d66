//! Persistent user id, kept in a small JSON key-value file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Key the user id is stored under.
pub const USER_ID_KEY: &str = "gallery_user_id";

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt identity file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Key-value store backed by one JSON object on disk.
#[derive(Clone, Debug)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> IdentityResult<BTreeMap<String, String>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(IdentityError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&text).map_err(|source| IdentityError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> IdentityResult<()> {
        let io_err = |source| IdentityError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = serde_json::to_string_pretty(values).map_err(|source| IdentityError::Parse {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, text).map_err(io_err)
    }

    /// Saved user id, if any. A missing file means no identity.
    pub fn load(&self) -> IdentityResult<Option<String>> {
        Ok(self
            .read_all()?
            .remove(USER_ID_KEY)
            .filter(|id| !id.is_empty()))
    }

    pub fn save(&self, user_id: &str) -> IdentityResult<()> {
        let mut values = self.read_all()?;
        values.insert(USER_ID_KEY.to_string(), user_id.to_string());
        self.write_all(&values)?;
        log::debug!("Saved user id to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> IdentityResult<()> {
        let mut values = self.read_all()?;
        if values.remove(USER_ID_KEY).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_means_no_identity() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdentityStore::new(dir.path().join("identity.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdentityStore::new(dir.path().join("nested").join("identity.json"));

        store.save("k3x9a2bq").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("k3x9a2bq"));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"gallery_user_id\""));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_other_keys_survive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        std::fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

        let store = IdentityStore::new(&path);
        store.save("abc").unwrap();
        store.clear().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("theme"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        std::fs::write(&path, "not json").unwrap();

        let store = IdentityStore::new(&path);
        assert!(matches!(store.load(), Err(IdentityError::Parse { .. })));
    }
}
