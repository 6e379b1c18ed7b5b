//! Persistent named-entry storage backing the session store.
//!
//! Mirrors a browser's local storage: string values under string keys.
//! Writes take several entries at once so a token/user pair is never
//! observed half-written.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use tracing::warn;

use crate::error::{Error, Result, SessionErrorCode};

/// Key-value storage for session entries.
pub trait SessionStorage: Send + Sync {
    /// Reads one entry.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Reads several entries from one snapshot, in `keys` order.
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>>;

    /// Writes all entries in one step.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()>;

    /// Removes all keys in one step. Missing keys are not an error.
    fn remove_many(&self, keys: &[&str]) -> Result<()>;

    /// Removes the keys of `expected` only if each still holds its expected
    /// value (`None` meaning absent). Returns whether they were removed.
    fn remove_if_unchanged(&self, expected: &[(&str, Option<&str>)]) -> Result<bool>;
}

fn unchanged(entries: &HashMap<String, String>, expected: &[(&str, Option<&str>)]) -> bool {
    expected
        .iter()
        .all(|(key, value)| entries.get(*key).map(String::as_str) == *value)
}

/// In-process storage. Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a single raw entry, bypassing the session pairing.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries.write().insert(key.to_string(), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        let map = self.entries.read();
        Ok(keys.iter().map(|key| map.get(*key).cloned()).collect())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut map = self.entries.write();
        for (key, value) in entries {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut map = self.entries.write();
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }

    fn remove_if_unchanged(&self, expected: &[(&str, Option<&str>)]) -> Result<bool> {
        let mut map = self.entries.write();
        if !unchanged(&map, expected) {
            return Ok(false);
        }
        for (key, _) in expected {
            map.remove(*key);
        }
        Ok(true)
    }
}

/// JSON file storage that survives restarts.
///
/// Every write replaces the whole file via tmp file + fsync + rename, so a
/// reader sees either the old or the new set of entries.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| {
            Error::session(
                SessionErrorCode::StorageFailed,
                format!("failed to read {}: {}", self.path.display(), e),
            )
        })?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            Error::session(
                SessionErrorCode::Corrupt,
                format!("corrupt storage file {}: {}", self.path.display(), e),
            )
        })
    }

    /// Entries to start a write from. A corrupt file is replaced wholesale.
    fn entries_for_write(&self) -> Result<HashMap<String, String>> {
        match self.read_entries() {
            Err(Error::Session { code, .. }) if code == SessionErrorCode::Corrupt.code() => {
                warn!(path = %self.path.display(), "Overwriting corrupt session storage");
                Ok(HashMap::new())
            }
            other => other,
        }
    }

    fn write_entries(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.path.with_extension("tmp");
        let json = serde_json::to_string_pretty(entries)?;
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_entries()?.get(key).cloned())
    }

    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        let map = self.read_entries()?;
        Ok(keys.iter().map(|key| map.get(*key).cloned()).collect())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut map = self.entries_for_write()?;
        for (key, value) in entries {
            map.insert(key.to_string(), value.to_string());
        }
        self.write_entries(&map)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let _guard = self.write_lock.lock();
        let (mut map, corrupt) = match self.read_entries() {
            Ok(map) => (map, false),
            Err(Error::Session { code, .. }) if code == SessionErrorCode::Corrupt.code() => {
                warn!(path = %self.path.display(), "Clearing corrupt session storage");
                (HashMap::new(), true)
            }
            Err(e) => return Err(e),
        };
        let before = map.len();
        for key in keys {
            map.remove(*key);
        }
        if map.len() == before && !corrupt {
            return Ok(());
        }
        self.write_entries(&map)
    }

    fn remove_if_unchanged(&self, expected: &[(&str, Option<&str>)]) -> Result<bool> {
        let _guard = self.write_lock.lock();
        let mut map = self.read_entries()?;
        if !unchanged(&map, expected) {
            return Ok(false);
        }
        let before = map.len();
        for (key, _) in expected {
            map.remove(*key);
        }
        if map.len() != before {
            self.write_entries(&map)?;
        }
        Ok(true)
    }
}
