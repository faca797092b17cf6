//! User Profile Persistence
//!
//! Clients keep the signed-in user's profile under a single fixed key in a
//! small key-value store. No entry means signed out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Storage key holding the serialized profile
pub const PROFILE_KEY: &str = "scholarly-user";

/// The signed-in student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Identity provider that vouched for this user
    pub provider: String,
    pub signed_in_at: DateTime<Utc>,
}

/// Profile storage errors
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("IO error on {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// String key-value storage, the shape of browser local storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, ProfileError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ProfileError>;
    fn remove(&self, key: &str) -> Result<(), ProfileError>;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ProfileError> {
        let entries = self.entries.lock().map_err(|_| ProfileError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ProfileError> {
        let mut entries = self.entries.lock().map_err(|_| ProfileError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ProfileError> {
        let mut entries = self.entries.lock().map_err(|_| ProfileError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/scholarly/storage.json`
    pub fn default_location() -> Self {
        let dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir.join("scholarly").join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries. A file that is not a JSON object of strings reads as empty
    /// and is replaced on the next write.
    fn read_all(&self) -> Result<HashMap<String, String>, ProfileError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => Ok(entries),
                Err(e) => {
                    tracing::warn!(path = ?self.path, error = %e, "Ignoring unreadable storage file");
                    Ok(HashMap::new())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), ProfileError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let content = serde_json::to_string_pretty(entries)?;

        // Write beside the target then rename, so a crash never leaves half a file
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, content).map_err(|e| self.io_error(e))?;
        std::fs::rename(&staging, &self.path).map_err(|e| self.io_error(e))
    }

    fn io_error(&self, error: std::io::Error) -> ProfileError {
        ProfileError::Io {
            path: self.path.clone(),
            error: error.to_string(),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ProfileError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ProfileError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), ProfileError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Reads and writes the profile under `PROFILE_KEY`
pub struct ProfileStore<S> {
    store: S,
}

impl<S: KeyValueStore> ProfileStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The stored profile, or `None` when signed out. An unreadable entry is
    /// discarded and treated as signed out.
    pub fn load(&self) -> Result<Option<UserProfile>, ProfileError> {
        let Some(raw) = self.store.get(PROFILE_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable stored profile");
                self.store.remove(PROFILE_KEY)?;
                Ok(None)
            }
        }
    }

    pub fn save(&self, profile: &UserProfile) -> Result<(), ProfileError> {
        let raw = serde_json::to_string(profile)?;
        self.store.set(PROFILE_KEY, &raw)
    }

    /// Sign out
    pub fn clear(&self) -> Result<(), ProfileError> {
        self.store.remove(PROFILE_KEY)
    }

    pub fn is_signed_in(&self) -> Result<bool, ProfileError> {
        Ok(self.load()?.is_some())
    }
}
