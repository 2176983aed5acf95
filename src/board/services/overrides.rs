//! Operator overrides held until the ledger becomes authoritative.
//!
//! Values are persisted under `<ns>.<field>.<task_id>` as a JSON envelope
//! carrying the value and the time it was written. Storage problems never
//! surface to callers: a failed read is "no override" and a failed write is
//! logged and dropped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::board::{
    config::OverrideConfig,
    domain::{Override, OverrideField, TaskKey, TaskOverrides, TaskRecord},
    ports::KeyValueStore,
};

#[derive(Debug, Serialize, Deserialize)]
struct StoredOverride {
    value: Value,
    written_at: DateTime<Utc>,
}

/// Override store over a [`KeyValueStore`].
#[derive(Clone)]
pub struct OverrideStore<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    namespace: String,
}

impl<S, C> OverrideStore<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    /// Creates an override store.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>, config: &OverrideConfig) -> Self {
        Self {
            store,
            clock,
            namespace: config.namespace.trim().to_owned(),
        }
    }

    /// Returns the persisted key for a task field.
    #[must_use]
    pub fn key(&self, task_id: &TaskKey, field: OverrideField) -> String {
        format!("{}.{}.{}", self.namespace, field.as_str(), task_id)
    }

    /// Reads an override, treating any storage or decoding problem as absent.
    #[must_use]
    pub fn get(&self, task_id: &TaskKey, field: OverrideField) -> Option<Override> {
        let key = self.key(task_id, field);
        let raw = match self.store.get(&key) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "override read failed, ignoring");
                return None;
            }
        };
        match serde_json::from_str::<StoredOverride>(&raw) {
            Ok(stored) => Some(Override {
                task_id: task_id.clone(),
                field,
                value: stored.value,
                written_at: stored.written_at,
            }),
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "undecodable override, ignoring");
                None
            }
        }
    }

    /// Reads an override value.
    #[must_use]
    pub fn value(&self, task_id: &TaskKey, field: OverrideField) -> Option<Value> {
        self.get(task_id, field).map(|entry| entry.value)
    }

    /// Writes an override and returns whether it was persisted.
    pub fn set(&self, task_id: &TaskKey, field: OverrideField, value: Value) -> bool {
        let key = self.key(task_id, field);
        let stored = StoredOverride {
            value,
            written_at: self.clock.utc(),
        };
        let encoded = match serde_json::to_string(&stored) {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "override not serialisable, dropped");
                return false;
            }
        };
        match self.store.set(&key, &encoded) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "override write failed, dropped");
                false
            }
        }
    }

    /// Removes one override.
    pub fn clear(&self, task_id: &TaskKey, field: OverrideField) {
        let key = self.key(task_id, field);
        if let Err(err) = self.store.remove(&key) {
            tracing::warn!(key = %key, error = %err, "override removal failed");
        }
    }

    /// Removes every override held for a task.
    pub fn clear_task(&self, task_id: &TaskKey) {
        for field in OverrideField::ALL {
            self.clear(task_id, field);
        }
    }

    /// Removes every override in this namespace.
    pub fn clear_all(&self) {
        let prefix = format!("{}.", self.namespace);
        let keys = match self.store.keys_with_prefix(&prefix) {
            Ok(keys) => keys,
            Err(err) => {
                tracing::warn!(namespace = %self.namespace, error = %err, "override scan failed");
                return;
            }
        };
        for key in keys {
            if let Err(err) = self.store.remove(&key) {
                tracing::warn!(key = %key, error = %err, "override removal failed");
            }
        }
    }

    /// Collects the overrides held for a task.
    #[must_use]
    pub fn overrides_for(&self, task_id: &TaskKey) -> TaskOverrides {
        let as_string = |value: Value| match value {
            Value::String(text) => Some(text),
            Value::Null => None,
            other => Some(other.to_string()),
        };
        TaskOverrides {
            title: self
                .value(task_id, OverrideField::Title)
                .and_then(as_string),
            status: self
                .value(task_id, OverrideField::Status)
                .and_then(as_string),
            spec: self.value(task_id, OverrideField::Spec),
        }
    }

    /// Drops the status override once the ledger is authoritative for the
    /// task. Returns `true` when an override was present.
    pub fn invalidate_if_authoritative(&self, task: &TaskRecord) -> bool {
        if !task.ledger_asserts_terminal() {
            return false;
        }
        self.invalidate_status(task.id())
    }

    /// Drops the status override of a task the ledger just asserted terminal.
    /// Returns `true` when an override was present.
    pub fn invalidate_status(&self, task_id: &TaskKey) -> bool {
        let present = self.get(task_id, OverrideField::Status).is_some();
        if present {
            tracing::debug!(task_id = %task_id, "ledger asserted terminal state, clearing status override");
        }
        self.clear(task_id, OverrideField::Status);
        present
    }

    /// Returns whether the operator may still edit the task's fields.
    ///
    /// Once the ledger asserts a terminal state every field is read-only;
    /// existing title and spec overrides remain as history.
    #[must_use]
    pub fn is_editable(&self, task: &TaskRecord) -> bool {
        !task.ledger_asserts_terminal()
    }
}
