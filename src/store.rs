//! Key-value state stores for scheduler persistence.
//!
//! The scheduler persists its whole event queue as one JSON blob under a
//! single key. The store behind that key is injected at construction:
//! [`FileStore`] for real deployments, [`MemoryStore`] for embedders that
//! manage persistence themselves, and [`NullStore`] for environments with
//! no storage facility at all.

use crate::config;
use crate::error::{GoalError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// A string key-value store the scheduler saves its queue through.
pub trait StateStore: Send + Sync {
    /// Read the value for `key`, or `None` if it was never saved.
    fn load(&self, key: &str) -> Result<Option<String>>;
    /// Write the value for `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: StateStore + ?Sized> StateStore for std::sync::Arc<T> {
    fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        (**self).save(key, value)
    }
}

/// File-backed store: one JSON file per key under a root directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the given directory.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create a store rooted at the platform state directory
    /// (`dirs::config_dir()/wisp/`, overridable via `WISP_STATE_DIR`).
    #[must_use]
    pub fn default_root() -> Self {
        Self::new(config::state_dir())
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl StateStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GoalError::Store(format!("cannot read state '{key}': {e}"))),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .map_err(|e| GoalError::Store(format!("cannot create state dir: {e}")))?;
        std::fs::write(self.path_for(key), value)
            .map_err(|e| GoalError::Store(format!("cannot write state '{key}': {e}")))
    }
}

/// In-memory store for tests and self-persisting embedders.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| GoalError::Store("memory store poisoned".to_owned()))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| GoalError::Store("memory store poisoned".to_owned()))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Store that persists nothing: the "no storage facility" environment
/// made explicit. Loads return `None`, saves succeed and are discarded.
#[derive(Default)]
pub struct NullStore;

impl NullStore {
    /// Create a null store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl StateStore for NullStore {
    fn load(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn save(&self, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }
}
