//! Snapshot source serving a scripted response.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::board::ports::{SnapshotError, SnapshotResult, SnapshotSource};

/// Serves whatever response was last scripted with [`Self::respond_with`].
#[derive(Debug, Clone)]
pub struct InMemorySnapshotSource {
    response: Arc<RwLock<SnapshotResult<Value>>>,
}

impl InMemorySnapshotSource {
    /// Creates a source serving an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            response: Arc::new(RwLock::new(Ok(Value::Array(Vec::new())))),
        }
    }

    /// Replaces the scripted response.
    pub fn respond_with(&self, response: SnapshotResult<Value>) {
        if let Ok(mut guard) = self.response.write() {
            *guard = response;
        }
    }
}

impl Default for InMemorySnapshotSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotSource for InMemorySnapshotSource {
    async fn fetch_snapshot(&self) -> SnapshotResult<Value> {
        self.response
            .read()
            .map_err(|err| SnapshotError::Transport(err.to_string()))?
            .clone()
    }
}
