use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Fixed keys of the persisted namespace.
pub mod keys {
    pub const USERS: &str = "service_management_users";
    pub const SERVICES: &str = "service_management_services";
    pub const REQUESTS: &str = "service_management_requests";
    pub const TASKS: &str = "service_management_tasks";
    pub const CURRENT_USER: &str = "service_management_current_user";
    pub const THEME: &str = "service_management_theme";

    pub const ALL: &[&str] = &[USERS, SERVICES, REQUESTS, TASKS, CURRENT_USER, THEME];
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("i/o error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON under '{key}': {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String key-value persistence.
///
/// Methods take `&self`; backends that mutate use interior mutability. There is
/// no atomicity across keys and no locking, so the last writer wins.
pub trait Store {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let io = |source| StoreError::Io { key: key.to_string(), source };
        let mut f = OpenOptions::new().read(true).open(&path).map_err(io)?;
        let mut s = String::new();
        f.read_to_string(&mut s).map_err(io)?;
        Ok(Some(s))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let io = |source| StoreError::Io { key: key.to_string(), source };
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(io)?;
        }
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(self.path(key))
            .map_err(io)?;
        f.write_all(value.as_bytes()).map_err(io)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path(key);
        if path.exists() {
            fs::remove_file(path)
                .map_err(|source| StoreError::Io { key: key.to_string(), source })?;
        }
        Ok(())
    }
}

/// In-memory store, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Reads and deserializes the value under `key`.
///
/// Returns `default` when the key is absent, the backend fails, or the stored
/// JSON does not parse. Failures are logged, never returned.
pub fn read<T: DeserializeOwned>(store: &dyn Store, key: &str, default: T) -> T {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return default,
        Err(e) => {
            log::error!("Error reading {key}: {e}");
            return default;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(source) => {
            log::error!("{}", StoreError::Json { key: key.to_string(), source });
            default
        }
    }
}

/// Serializes `value` and stores it under `key`.
///
/// A failed write is logged and otherwise ignored; callers cannot observe it.
pub fn write<T: Serialize + ?Sized>(store: &dyn Store, key: &str, value: &T) {
    let s = match serde_json::to_string_pretty(value) {
        Ok(s) => s,
        Err(source) => {
            log::error!("{}", StoreError::Json { key: key.to_string(), source });
            return;
        }
    };
    if let Err(e) = store.set(key, &s) {
        log::error!("Error saving {key}: {e}");
    }
}

/// Removes `key`. Failures are logged and ignored.
pub fn remove(store: &dyn Store, key: &str) {
    if let Err(e) = store.remove(key) {
        log::error!("Error removing {key}: {e}");
    }
}

/// Removes every key of the namespace.
pub fn clear(store: &dyn Store) {
    for key in keys::ALL {
        remove(store, key);
    }
}
