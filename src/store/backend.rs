//! Key/value backends for persisted documents.

use super::preferences::Preferences;
use super::sanitize::{sanitize_preferences, sanitize_session};
use crate::core::session::LibrarySession;
use crate::error::StoreError;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

/// Key of the persisted library session
pub const SESSION_KEY: &str = "session";
/// Key of the persisted user preferences
pub const PREFERENCES_KEY: &str = "preferences";

/// Trait for document stores.
///
/// Backends only move strings; the typed helpers parse leniently and never
/// fail on bad data.
pub trait StoreBackend: Send + Sync {
    /// Raw document for `key`, or `None` when absent
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the document for `key`
    fn write(&self, key: &str, contents: &str) -> Result<(), StoreError>;

    /// Delete the document for `key` (absent keys are fine)
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Parsed JSON for `key`; unreadable or corrupt documents read as absent
    fn load_value(&self, key: &str) -> Option<Value> {
        let raw = match self.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "No stored document, using defaults");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Stored document unreadable, using defaults");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Stored document is not valid JSON, using defaults");
                None
            }
        }
    }

    fn save_value<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError>
    where
        Self: Sized,
    {
        let contents =
            serde_json::to_string_pretty(value).map_err(|e| StoreError::Serialize {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        self.write(key, &contents)
    }

    fn load_session(&self) -> LibrarySession {
        self.load_value(SESSION_KEY)
            .map(|value| sanitize_session(&value))
            .unwrap_or_default()
    }

    fn save_session(&self, session: &LibrarySession) -> Result<(), StoreError>
    where
        Self: Sized,
    {
        self.save_value(SESSION_KEY, session)
    }

    fn load_preferences(&self) -> Preferences {
        self.load_value(PREFERENCES_KEY)
            .map(|value| sanitize_preferences(&value))
            .unwrap_or_default()
    }

    fn save_preferences(&self, preferences: &Preferences) -> Result<(), StoreError>
    where
        Self: Sized,
    {
        self.save_value(PREFERENCES_KEY, preferences)
    }
}

/// Stores each key as `<dir>/<key>.json`
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Open a store rooted at `dir`, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Platform data directory (e.g. `~/.local/share/theme-pair-matcher`)
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("theme-pair-matcher")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StoreBackend for JsonStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read { path, source }),
        }
    }

    fn write(&self, key: &str, contents: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        // Write next to the target, then rename over it
        let staging = self.dir.join(format!("{}.json.tmp", key));

        fs::write(&staging, contents).map_err(|source| StoreError::Write {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &path).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;

        debug!(key, path = %path.display(), "Saved document");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Write { path, source }),
        }
    }
}

/// In-memory backend
///
/// Useful for tests and for front ends that persist elsewhere.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreBackend for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let documents = self.documents.read().map_err(|_| StoreError::Poisoned)?;
        Ok(documents.get(key).cloned())
    }

    fn write(&self, key: &str, contents: &str) -> Result<(), StoreError> {
        let mut documents = self.documents.write().map_err(|_| StoreError::Poisoned)?;
        documents.insert(key.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut documents = self.documents.write().map_err(|_| StoreError::Poisoned)?;
        documents.remove(key);
        Ok(())
    }
}
