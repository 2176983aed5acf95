//! Port for the scoped, durable key-value store backing operator overrides.

use std::sync::Arc;
use thiserror::Error;

/// Result type for key-value store operations.
pub type KeyValueStoreResult<T> = Result<T, KeyValueStoreError>;

/// String key-value storage that survives a reload.
///
/// Each `set` must be atomic per key: readers never observe a partially
/// written value. Absence of a key is never an error.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueStoreError`] when the backing storage cannot be read.
    fn get(&self, key: &str) -> KeyValueStoreResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueStoreError::QuotaExceeded`] when the store is full or
    /// [`KeyValueStoreError::Persistence`] when the write fails.
    fn set(&self, key: &str, value: &str) -> KeyValueStoreResult<()>;

    /// Removes `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueStoreError::Persistence`] when the write fails.
    fn remove(&self, key: &str) -> KeyValueStoreResult<()>;

    /// Lists all keys starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueStoreError`] when the backing storage cannot be read.
    fn keys_with_prefix(&self, prefix: &str) -> KeyValueStoreResult<Vec<String>>;
}

/// Errors returned by key-value store implementations.
#[derive(Debug, Clone, Error)]
pub enum KeyValueStoreError {
    /// The store refused the write because it is full.
    #[error("storage quota exceeded while writing {key}")]
    QuotaExceeded {
        /// Key being written.
        key: String,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl KeyValueStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
