//! Persistent session storage
//!
//! Stores the raw `token` string and the JSON-serialized `user` object so a
//! session survives process restarts. The file backend keeps one file per key
//! with restrictive permissions on Unix.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;

/// Storage key for the raw bearer token
pub const TOKEN_KEY: &str = "token";
/// Storage key for the JSON-serialized user object
pub const USER_KEY: &str = "user";

/// Storage errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Key/value store for session state
pub trait SessionStorage: Send + Sync {
    /// Read a value; `None` when the key is absent
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value; absent keys are not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// File-based session storage, one file per key
pub struct FileSessionStorage {
    base_path: PathBuf,
}

impl FileSessionStorage {
    /// Create storage rooted at the given directory
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Default per-user location (`~/.rideops/session`)
    pub fn default_location() -> Result<Self, StorageError> {
        let home = dirs::home_dir()
            .ok_or_else(|| StorageError::Storage("Cannot find home directory".into()))?;
        let path = home.join(".rideops/session");

        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            let mut builder = std::fs::DirBuilder::new();
            builder.recursive(true).mode(0o700);
            builder
                .create(&path)
                .map_err(|e| StorageError::Io(e.to_string()))?;
        }

        #[cfg(not(unix))]
        {
            std::fs::create_dir_all(&path).map_err(|e| StorageError::Io(e.to_string()))?;
        }

        Ok(Self::new(path))
    }

    fn key_path(&self, key: &str) -> PathBuf {
        // Sanitize key to prevent path traversal
        let safe_key = key.replace(['/', '\\'], "_").replace("..", "_");
        self.base_path.join(safe_key)
    }
}

impl SessionStorage for FileSessionStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| StorageError::Io(e.to_string()))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.base_path).map_err(|e| StorageError::Io(e.to_string()))?;

        let path = self.key_path(key);
        std::fs::write(&path, value).map_err(|e| StorageError::Io(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, perms).map_err(|e| StorageError::Io(e.to_string()))?;
        }

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.key_path(key);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        Ok(())
    }
}

/// In-memory session storage for tests and ephemeral processes
#[derive(Default)]
pub struct MemorySessionStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_storage_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSessionStorage::new(temp_dir.path());

        assert!(storage.read(TOKEN_KEY).unwrap().is_none());

        storage.write(TOKEN_KEY, "abc.def.ghi").unwrap();
        assert_eq!(
            storage.read(TOKEN_KEY).unwrap().as_deref(),
            Some("abc.def.ghi")
        );

        storage.remove(TOKEN_KEY).unwrap();
        assert!(storage.read(TOKEN_KEY).unwrap().is_none());

        // Removing an absent key is fine
        storage.remove(TOKEN_KEY).unwrap();
    }

    #[test]
    fn file_storage_sanitizes_keys() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSessionStorage::new(temp_dir.path());

        storage.write("../escape", "value").unwrap();
        assert!(temp_dir.path().join("__escape").exists());
    }

    #[cfg(unix)]
    #[test]
    fn file_storage_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let storage = FileSessionStorage::new(temp_dir.path());
        storage.write(TOKEN_KEY, "secret").unwrap();

        let mode = std::fs::metadata(temp_dir.path().join(TOKEN_KEY))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn memory_storage_round_trip() {
        let storage = MemorySessionStorage::new();

        storage.write(USER_KEY, r#"{"id":1}"#).unwrap();
        assert_eq!(
            storage.read(USER_KEY).unwrap().as_deref(),
            Some(r#"{"id":1}"#)
        );

        storage.remove(USER_KEY).unwrap();
        assert!(storage.read(USER_KEY).unwrap().is_none());
    }
}
