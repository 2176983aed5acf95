//! Precedence derivation of the displayed stage and status of a task.
//!
//! The ledger reports several partially redundant attributes per task. The
//! board shows exactly one `{stage, status}` pair, chosen by a fixed
//! precedence so that the same record always renders the same badge.

use super::{LedgerStage, TaskRecord, TerminalOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage badge shown for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayStage {
    /// Not yet picked up by the pipeline.
    Scheduled,
    /// Accepted by the planner and waiting for work.
    Queued,
    /// Planning (only shown for failed tasks).
    Planner,
    /// Being executed by a worker.
    Worker,
    /// Being validated.
    Validator,
    /// Being deployed.
    Deploy,
    /// Finished.
    Done,
}

impl DisplayStage {
    /// Returns the display label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Queued => "Queued",
            Self::Planner => "Planner",
            Self::Worker => "Worker",
            Self::Validator => "Validator",
            Self::Deploy => "Deploy",
            Self::Done => "Done",
        }
    }
}

impl From<LedgerStage> for DisplayStage {
    fn from(stage: LedgerStage) -> Self {
        match stage {
            LedgerStage::Planner => Self::Planner,
            LedgerStage::Worker => Self::Worker,
            LedgerStage::Validator => Self::Validator,
            LedgerStage::Deploy => Self::Deploy,
        }
    }
}

impl fmt::Display for DisplayStage {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Status badge shown for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    /// Waiting to start.
    Scheduled,
    /// Moving through the pipeline.
    InProgress,
    /// Finished successfully.
    Success,
    /// Finished unsuccessfully or blocked.
    Failed,
}

impl DisplayStatus {
    /// Returns the canonical label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// The single stage/status pair rendered for a task. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DerivedState {
    /// Stage badge.
    pub stage: DisplayStage,
    /// Status badge.
    pub status: DisplayStatus,
}

impl DerivedState {
    /// Creates a derived state from its parts.
    #[must_use]
    pub const fn new(stage: DisplayStage, status: DisplayStatus) -> Self {
        Self { stage, status }
    }
}

/// Derives the displayed state of a task.
///
/// Rules are evaluated highest precedence first and the first match wins:
///
/// 1. a terminal record is `Done`, succeeding only on an explicit `success`
///    outcome;
/// 2. raw status `done` is `Done`/`success`;
/// 3. raw status `failed` or `blocked` keeps the ledger stage (default
///    `Planner`) with status `failed`;
/// 4. otherwise the ledger stage decides, and an absent stage is `Scheduled`.
///
/// # Examples
///
/// ```
/// use ledgerboard::board::domain::{
///     DisplayStage, DisplayStatus, TaskKey, TaskRecord, TerminalOutcome, derive,
/// };
///
/// let key = TaskKey::new("T-1002").expect("valid key");
/// let task = TaskRecord::new(key, "Rollout")
///     .with_raw_status("done")
///     .with_terminal(Some(TerminalOutcome::Failed));
/// let state = derive(&task);
/// assert_eq!(state.stage, DisplayStage::Done);
/// assert_eq!(state.status, DisplayStatus::Failed);
/// ```
#[must_use]
pub fn derive(task: &TaskRecord) -> DerivedState {
    if task.is_terminal() {
        let status = if task.terminal_outcome() == Some(TerminalOutcome::Success) {
            DisplayStatus::Success
        } else {
            DisplayStatus::Failed
        };
        return DerivedState::new(DisplayStage::Done, status);
    }

    let raw_status = task.raw_status().trim().to_ascii_lowercase();
    match raw_status.as_str() {
        "done" => return DerivedState::new(DisplayStage::Done, DisplayStatus::Success),
        "failed" | "blocked" => {
            let stage = task
                .ledger_stage()
                .map_or(DisplayStage::Planner, DisplayStage::from);
            return DerivedState::new(stage, DisplayStatus::Failed);
        }
        _ => {}
    }

    match task.ledger_stage() {
        Some(LedgerStage::Deploy) => {
            DerivedState::new(DisplayStage::Deploy, DisplayStatus::InProgress)
        }
        Some(LedgerStage::Validator) => {
            DerivedState::new(DisplayStage::Validator, DisplayStatus::InProgress)
        }
        Some(LedgerStage::Worker) => {
            DerivedState::new(DisplayStage::Worker, DisplayStatus::InProgress)
        }
        Some(LedgerStage::Planner) => {
            DerivedState::new(DisplayStage::Queued, DisplayStatus::InProgress)
        }
        None => DerivedState::new(DisplayStage::Scheduled, DisplayStatus::Scheduled),
    }
}

/// Derives the state shown by stage and status badge views.
#[must_use]
pub fn derive_for_render(task: &TaskRecord) -> DerivedState {
    derive(task)
}
