//! Durable token storage.
//!
//! The session keeps two string entries, `refresh_token` and `access_token`,
//! and removes both together on logout. Backends:
//! - `FileStore`: one file per entry under the cache directory
//! - `KeyringStore`: the OS keychain
//! - `MemoryStore`: process-local, for tests and `--ephemeral` runs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use keyring::Entry;
use thiserror::Error;

pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Keyring service name
const SERVICE_NAME: &str = "subdomains";

/// Directory under the cache dir holding token files
const SESSION_DIR: &str = "session";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Token storage I/O failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Keychain access failed for {key}: {source}")]
    Keyring {
        key: String,
        #[source]
        source: keyring::Error,
    },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Removing an absent entry succeeds.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            dir: cache_dir.join(SESSION_DIR),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn io_err(key: &str) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
        move |source| StorageError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl TokenStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(contents) => {
                let value = contents.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_err(key)(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(Self::io_err(key))?;
        let path = self.path(key);
        std::fs::write(&path, value).map_err(Self::io_err(key))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .map_err(Self::io_err(key))?;
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_err(key)(e)),
        }
    }
}

pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    fn entry(&self, key: &str) -> StorageResult<Entry> {
        Entry::new(&self.service, key).map_err(|source| StorageError::Keyring {
            key: key.to_string(),
            source,
        })
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(source) => Err(StorageError::Keyring {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(|source| StorageError::Keyring {
                key: key.to_string(),
                source,
            })
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(source) => Err(StorageError::Keyring {
                key: key.to_string(),
                source,
            }),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.lock().insert(key.to_string(), value.to_string());
        store
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap(), None);
        store.set(REFRESH_TOKEN_KEY, "T1").unwrap();
        store.set(ACCESS_TOKEN_KEY, "A1").unwrap();
        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("T1"));
        assert!(dir.path().join("session").join("access_token").exists());

        store.remove(REFRESH_TOKEN_KEY).unwrap();
        store.remove(ACCESS_TOKEN_KEY).unwrap();
        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.remove(ACCESS_TOKEN_KEY).unwrap();
    }

    #[test]
    fn test_file_store_treats_blank_file_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set(REFRESH_TOKEN_KEY, "  \n").unwrap();
        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::with_entry(REFRESH_TOKEN_KEY, "T1");
        assert!(!store.is_empty());
        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("T1"));
        store.remove(REFRESH_TOKEN_KEY).unwrap();
        assert!(store.is_empty());
    }
}
