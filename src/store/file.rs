//! File Store Module
//!
//! Durable store backed by a single JSON object file.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info};

use super::KeyValueStore;
use crate::error::{Error, Result};

// == File Store ==
/// Key-value store persisted to a JSON file.
///
/// The whole map is loaded once at open and rewritten on every `set` through
/// a temporary file followed by a rename, so a crash mid-write leaves the
/// previous contents intact.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`, creating an empty one if the file is missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| Error::Store(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        info!(path = %path.display(), keys = values.len(), "Opened file store");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let text = serde_json::to_string(values)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), keys = values.len(), "Persisted file store");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    /// The in-memory map only changes once the file write succeeded, so a
    /// failed `set` leaves both views unchanged.
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock();
        let unchanged = if value.is_empty() {
            !values.contains_key(key)
        } else {
            values.get(key).map(String::as_str) == Some(value)
        };
        if unchanged {
            return Ok(());
        }

        let mut next = values.clone();
        if value.is_empty() {
            next.remove(key);
        } else {
            next.insert(key.to_string(), value.to_string());
        }
        self.persist(&next)?;
        *values = next;
        Ok(())
    }
}
