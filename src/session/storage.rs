//! Durable storage for the session blob
//!
//! Storage backends only move an opaque string; serialization happens in
//! [`SessionStore`](super::SessionStore), the single persistence point.

use super::SessionError;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Where the serialized session lives between runs
pub trait SessionStorage: Send + Sync {
    /// Read the stored blob, `None` when nothing was stored yet
    fn load(&self) -> Result<Option<String>, SessionError>;

    /// Replace the stored blob
    fn save(&self, blob: &str) -> Result<(), SessionError>;
}

/// JSON file on disk, replaced atomically on every save
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<String>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, blob: &str) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, blob)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-process storage for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blob: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with a blob, as if written by an earlier run
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, SessionError> {
        let guard = self
            .blob
            .lock()
            .map_err(|e| SessionError::Lock(e.to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, blob: &str) -> Result<(), SessionError> {
        let mut guard = self
            .blob
            .lock()
            .map_err(|e| SessionError::Lock(e.to_string()))?;
        *guard = Some(blob.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_storage_missing_file() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("session.json"));
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_file_storage_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("capstone").join("session.json");
        let storage = FileStorage::new(&path);

        storage.save(r#"{"state":{}}"#).unwrap();
        assert!(path.exists());
        assert_eq!(storage.load().unwrap().as_deref(), Some(r#"{"state":{}}"#));
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert!(storage.load().unwrap().is_none());
        storage.save("blob").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("blob"));
    }
}
