//! Task snapshot records as delivered by the ledger backend.

use super::{BoardColumn, ParseLedgerStageError, TaskKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Pipeline stage reported by the ledger for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerStage {
    /// The planner is decomposing the task.
    Planner,
    /// A worker is executing the task.
    Worker,
    /// The validator is checking the worker output.
    Validator,
    /// The result is being deployed.
    Deploy,
}

impl LedgerStage {
    /// Returns the canonical ledger label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planner => "Planner",
            Self::Worker => "Worker",
            Self::Validator => "Validator",
            Self::Deploy => "Deploy",
        }
    }
}

impl fmt::Display for LedgerStage {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for LedgerStage {
    type Error = ParseLedgerStageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "planner" => Ok(Self::Planner),
            "worker" => Ok(Self::Worker),
            "validator" => Ok(Self::Validator),
            "deploy" => Ok(Self::Deploy),
            _ => Err(ParseLedgerStageError(value.to_owned())),
        }
    }
}

/// Outcome recorded by the ledger for a terminal task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalOutcome {
    /// The task finished successfully.
    Success,
    /// The task finished unsuccessfully.
    Failed,
}

impl TerminalOutcome {
    /// Parses an outcome label: `success`, or `failed`/`failure`. Any other
    /// label is absent.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "success" => Some(Self::Success),
            "failed" | "failure" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One task as it appears in a ledger snapshot.
///
/// Records are replaced wholesale on every refresh; the core never edits a
/// record in place.
///
/// # Examples
///
/// ```
/// use ledgerboard::board::domain::{LedgerStage, TaskKey, TaskRecord};
///
/// let key = TaskKey::new("T-1001").expect("valid key");
/// let task = TaskRecord::new(key, "Ship the docs")
///     .with_raw_status("moving")
///     .with_ledger_stage(LedgerStage::Planner);
/// assert!(!task.is_terminal());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    id: TaskKey,
    title: String,
    raw_status: String,
    ledger_column: Option<BoardColumn>,
    ledger_stage: Option<LedgerStage>,
    is_terminal: bool,
    terminal_outcome: Option<TerminalOutcome>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
    metadata: Map<String, Value>,
}

impl TaskRecord {
    /// Creates a non-terminal record with an empty status.
    #[must_use]
    pub fn new(id: TaskKey, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            raw_status: String::new(),
            ledger_column: None,
            ledger_stage: None,
            is_terminal: false,
            terminal_outcome: None,
            created_at: None,
            updated_at: None,
            deleted_at: None,
            metadata: Map::new(),
        }
    }

    /// Sets the raw backend status.
    #[must_use]
    pub fn with_raw_status(mut self, status: impl Into<String>) -> Self {
        self.raw_status = status.into();
        self
    }

    /// Sets the column asserted by the ledger.
    #[must_use]
    pub const fn with_ledger_column(mut self, column: BoardColumn) -> Self {
        self.ledger_column = Some(column);
        self
    }

    /// Sets the pipeline stage reported by the ledger.
    #[must_use]
    pub const fn with_ledger_stage(mut self, stage: LedgerStage) -> Self {
        self.ledger_stage = Some(stage);
        self
    }

    /// Marks the record terminal with the given outcome.
    #[must_use]
    pub const fn with_terminal(mut self, outcome: Option<TerminalOutcome>) -> Self {
        self.is_terminal = true;
        self.terminal_outcome = outcome;
        self
    }

    /// Sets the creation and update timestamps.
    #[must_use]
    pub const fn with_timestamps(
        mut self,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    /// Sets the soft-deletion timestamp.
    #[must_use]
    pub const fn with_deleted_at(mut self, deleted_at: DateTime<Utc>) -> Self {
        self.deleted_at = Some(deleted_at);
        self
    }

    /// Replaces the free-form metadata object.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Returns the task key.
    #[must_use]
    pub const fn id(&self) -> &TaskKey {
        &self.id
    }

    /// Returns the ledger title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the raw backend status.
    #[must_use]
    pub fn raw_status(&self) -> &str {
        &self.raw_status
    }

    /// Returns the column asserted by the ledger, if any.
    #[must_use]
    pub const fn ledger_column(&self) -> Option<BoardColumn> {
        self.ledger_column
    }

    /// Returns the pipeline stage reported by the ledger, if any.
    #[must_use]
    pub const fn ledger_stage(&self) -> Option<LedgerStage> {
        self.ledger_stage
    }

    /// Returns whether the ledger marked the task terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    /// Returns the terminal outcome, if recorded.
    #[must_use]
    pub const fn terminal_outcome(&self) -> Option<TerminalOutcome> {
        self.terminal_outcome
    }

    /// Returns the creation timestamp, if reported.
    #[must_use]
    pub const fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Returns the latest update timestamp, if reported.
    #[must_use]
    pub const fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Returns the soft-deletion timestamp, if any.
    #[must_use]
    pub const fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns the free-form metadata object.
    #[must_use]
    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Returns `true` when the metadata carries `flag: true`.
    #[must_use]
    pub fn metadata_flag(&self, flag: &str) -> bool {
        self.metadata
            .get(flag)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Returns `true` when the ledger is authoritative for this task's status.
    ///
    /// Status overrides must not survive past this point.
    #[must_use]
    pub fn ledger_asserts_terminal(&self) -> bool {
        self.is_terminal || self.ledger_column == Some(BoardColumn::Completed)
    }
}
