//! Operator overrides held locally until the ledger becomes authoritative.

use super::{ParseOverrideFieldError, TaskKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Task field an operator may override locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideField {
    /// Task title.
    Title,
    /// Board status.
    Status,
    /// Structured task specification.
    Spec,
}

impl OverrideField {
    /// All overridable fields.
    pub const ALL: [Self; 3] = [Self::Title, Self::Status, Self::Spec];

    /// Returns the key segment used in persisted override keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Status => "status",
            Self::Spec => "spec",
        }
    }
}

impl fmt::Display for OverrideField {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for OverrideField {
    type Error = ParseOverrideFieldError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "status" => Ok(Self::Status),
            "spec" => Ok(Self::Spec),
            _ => Err(ParseOverrideFieldError(value.to_owned())),
        }
    }
}

/// A single locally held override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    /// Task the override applies to.
    pub task_id: TaskKey,
    /// Overridden field.
    pub field: OverrideField,
    /// Override value; a string for title and status, any JSON for spec.
    pub value: Value,
    /// When the operator wrote the override.
    pub written_at: DateTime<Utc>,
}

/// All overrides currently held for one task, as read by the filter and
/// renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOverrides {
    /// Title override.
    pub title: Option<String>,
    /// Status override.
    pub status: Option<String>,
    /// Specification override.
    pub spec: Option<Value>,
}

impl TaskOverrides {
    /// Returns an empty override set.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns an override set carrying only a status override.
    #[must_use]
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Self::default()
        }
    }

    /// Returns `true` when no field is overridden.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.status.is_none() && self.spec.is_none()
    }
}
