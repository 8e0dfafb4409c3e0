use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::TokenkeepError;

/// Host-provided secure storage for the persisted token set.
///
/// The manager is the only writer; keys are opaque namespaces chosen by the
/// embedding application (typically one per provider).
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Read the value for a key, `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, TokenkeepError>;

    /// Write the value for a key, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), TokenkeepError>;

    /// Remove the value for a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), TokenkeepError>;
}

impl std::fmt::Debug for dyn TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish()
    }
}

/// In-memory store for tests and for hosts that persist elsewhere.
#[derive(Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TokenkeepError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| TokenkeepError::StoreUnavailable(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), TokenkeepError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| TokenkeepError::StoreUnavailable(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), TokenkeepError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| TokenkeepError::StoreUnavailable(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// File-backed store: one `tokens.json` per key under a dot-directory in the
/// user's home (or an explicit root, for tests).
pub struct FileTokenStore {
    root: PathBuf,
}

impl FileTokenStore {
    /// Store under `~/.tokenkeep`.
    pub fn new() -> Self {
        let root = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tokenkeep");
        Self { root }
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key).join("tokens.json")
    }
}

impl Default for FileTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TokenkeepError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TokenkeepError::StoreUnavailable(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), TokenkeepError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TokenkeepError::StoreUnavailable(format!(
                    "Failed to create {}: {e}",
                    parent.display()
                ))
            })?;
        }
        std::fs::write(&path, value).map_err(|e| {
            TokenkeepError::StoreUnavailable(format!("Failed to write {}: {e}", path.display()))
        })
    }

    async fn remove(&self, key: &str) -> Result<(), TokenkeepError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TokenkeepError::StoreUnavailable(format!(
                "Failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}
