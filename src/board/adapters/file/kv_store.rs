//! Durable key-value store persisted as a single JSON document.
//!
//! The document lives in a capability-scoped directory. Every write goes to a
//! temporary sibling first and is then renamed over the document, so a
//! reload never observes a half-written value.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::sync::{Arc, RwLock};

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

use crate::board::ports::{KeyValueStore, KeyValueStoreError, KeyValueStoreResult};

const STAGING_SUFFIX: &str = ".tmp";

/// File-backed [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: Arc<Dir>,
    file_name: String,
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl FileKeyValueStore {
    /// Opens (or lazily creates) the store document at `path`.
    ///
    /// A missing document starts an empty store. A document that is not a
    /// JSON object of strings is discarded and logged: overrides are a cache
    /// and never block start-up.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueStoreError::Persistence`] when the parent directory
    /// cannot be opened or the document cannot be read.
    pub fn open(path: &Utf8Path) -> KeyValueStoreResult<Self> {
        let file_name = path
            .file_name()
            .ok_or_else(|| {
                KeyValueStoreError::persistence(std::io::Error::other(
                    "store path must include a file name",
                ))
            })?
            .to_owned();
        let parent = path
            .parent()
            .filter(|dir| !dir.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let dir = Dir::open_ambient_dir(parent, ambient_authority())
            .map_err(KeyValueStoreError::persistence)?;

        let entries = match dir.read_to_string(&file_name) {
            Ok(contents) => decode_document(&contents, path),
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(KeyValueStoreError::persistence(err)),
        };

        Ok(Self {
            dir: Arc::new(dir),
            file_name,
            entries: Arc::new(RwLock::new(entries)),
        })
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> KeyValueStoreResult<()> {
        let document = serde_json::to_string(entries).map_err(KeyValueStoreError::persistence)?;
        let staging = format!("{}{STAGING_SUFFIX}", self.file_name);
        self.dir
            .write(&staging, document)
            .map_err(KeyValueStoreError::persistence)?;
        self.dir
            .rename(&staging, &self.dir, &self.file_name)
            .map_err(KeyValueStoreError::persistence)
    }

    /// Applies `mutate` to a copy of the entries and commits it only once the
    /// copy has been persisted.
    fn commit<F>(&self, mutate: F) -> KeyValueStoreResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut guard = self.entries.write().map_err(|err| {
            KeyValueStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let mut next = guard.clone();
        mutate(&mut next);
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }
}

fn decode_document(contents: &str, path: &Utf8Path) -> BTreeMap<String, String> {
    serde_json::from_str(contents).unwrap_or_else(|err| {
        tracing::warn!(path = %path, error = %err, "discarding unreadable override store");
        BTreeMap::new()
    })
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> KeyValueStoreResult<Option<String>> {
        let guard = self.entries.read().map_err(|err| {
            KeyValueStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> KeyValueStoreResult<()> {
        self.commit(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> KeyValueStoreResult<()> {
        self.commit(|entries| {
            entries.remove(key);
        })
    }

    fn keys_with_prefix(&self, prefix: &str) -> KeyValueStoreResult<Vec<String>> {
        let guard = self.entries.read().map_err(|err| {
            KeyValueStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(guard
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}
