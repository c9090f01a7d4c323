//! Persisted build manifest (`build_info.json`).
//!
//! The manifest maps each source path to the content hash it had at its last
//! successful compile. It is the only state carried between runs.
//!
//! ```json
//! {
//!   "src/main.c": { "hash": "5d41402abc4b2a76b9719d911017c592" }
//! }
//! ```
//!
//! Unknown fields on an entry are kept and written back unchanged. Keys are
//! written in sorted order.

use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default file name of the manifest inside the output directory.
pub const MANIFEST_FILE: &str = "build_info.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<ContentHash>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Manifest {
    /// Recorded hash for `source`, if any.
    pub fn hash_of(&self, source: &Path) -> Option<ContentHash> {
        self.entries.get(&key(source)).and_then(|e| e.hash)
    }

    /// Records a successful compile of `source`. Extra fields on an existing
    /// entry survive.
    pub fn record(&mut self, source: &Path, hash: ContentHash) {
        self.entries.entry(key(source)).or_default().hash = Some(hash);
    }

    pub fn forget(&mut self, source: &Path) {
        self.entries.remove(&key(source));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn key(source: &Path) -> String {
    source.to_string_lossy().into_owned()
}

/// Manifest storage failures. Never fatal to a build.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to read manifest {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("manifest {} is malformed: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize manifest: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write manifest {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Loads and saves a [`Manifest`] at a fixed path.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the manifest, treating any failure as "no history".
    pub fn load(&self) -> Manifest {
        self.try_load().unwrap_or_default()
    }

    /// Like [`load`](Self::load) but reports why history was discarded.
    /// A missing file is not an error.
    pub fn try_load(&self) -> Result<Manifest, StorageError> {
        if !self.path.exists() {
            return Ok(Manifest::default());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, manifest: &Manifest) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(manifest).map_err(StorageError::Serialize)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, content).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Deletes the manifest file. Returns whether one existed.
    pub fn remove(&self) -> Result<bool, StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StorageError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_lookup() {
        let mut manifest = Manifest::default();
        let hash = ContentHash::from_bytes(b"a");
        manifest.record(Path::new("src/a.c"), hash);
        assert_eq!(manifest.hash_of(Path::new("src/a.c")), Some(hash));
        assert_eq!(manifest.hash_of(Path::new("src/b.c")), None);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path().join(MANIFEST_FILE));
        assert!(store.try_load().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        fs::write(&path, "{ not json").unwrap();
        let store = ManifestStore::new(&path);
        assert!(matches!(store.try_load(), Err(StorageError::Parse { .. })));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path().join("nested").join(MANIFEST_FILE));
        let mut manifest = Manifest::default();
        manifest.record(Path::new("main.c"), ContentHash::from_bytes(b"main"));
        store.save(&manifest).unwrap();
        assert_eq!(store.load(), manifest);
    }

    #[test]
    fn test_parse_format() {
        let json = r#"{
  "src/a.c": { "hash": "00112233445566778899aabbccddeeff" },
  "src/b.c": { "hash": null }
}"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(
            manifest.hash_of(Path::new("src/a.c")).unwrap().to_string(),
            "00112233445566778899aabbccddeeff"
        );
        assert_eq!(manifest.hash_of(Path::new("src/b.c")), None);
    }

    #[test]
    fn test_unknown_fields_survive_record() {
        let json = r#"{ "a.c": { "hash": "00112233445566778899aabbccddeeff", "flags": "-O2" } }"#;
        let mut manifest: Manifest = serde_json::from_str(json).unwrap();
        manifest.record(Path::new("a.c"), ContentHash::from_bytes(b"new"));

        let out = serde_json::to_string(&manifest).unwrap();
        assert!(out.contains("\"flags\":\"-O2\""));
        assert!(!out.contains("00112233445566778899aabbccddeeff"));
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path().join(MANIFEST_FILE));
        assert!(!store.remove().unwrap());
        store.save(&Manifest::default()).unwrap();
        assert!(store.remove().unwrap());
    }
}
