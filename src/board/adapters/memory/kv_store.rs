//! In-memory key-value store for tests and ephemeral sessions.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::board::ports::{KeyValueStore, KeyValueStoreError, KeyValueStoreResult};

/// Thread-safe in-memory key-value store.
///
/// An optional entry limit simulates quota eviction: writes of new keys past
/// the limit fail with [`KeyValueStoreError::QuotaExceeded`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
    max_entries: Option<usize>,
}

impl InMemoryKeyValueStore {
    /// Creates an empty, unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store holding at most `max_entries` keys.
    #[must_use]
    pub fn with_quota(max_entries: usize) -> Self {
        Self {
            entries: Arc::default(),
            max_entries: Some(max_entries),
        }
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Returns `true` if no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned(err: impl ToString) -> KeyValueStoreError {
    KeyValueStoreError::persistence(std::io::Error::other(err.to_string()))
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> KeyValueStoreResult<Option<String>> {
        let guard = self.entries.read().map_err(poisoned)?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> KeyValueStoreResult<()> {
        let mut guard = self.entries.write().map_err(poisoned)?;
        let is_new_key = !guard.contains_key(key);
        if is_new_key && self.max_entries.is_some_and(|limit| guard.len() >= limit) {
            return Err(KeyValueStoreError::QuotaExceeded {
                key: key.to_owned(),
            });
        }
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> KeyValueStoreResult<()> {
        let mut guard = self.entries.write().map_err(poisoned)?;
        guard.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> KeyValueStoreResult<Vec<String>> {
        let guard = self.entries.read().map_err(poisoned)?;
        Ok(guard
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}
