//! Column placement and visibility rules for the board.
//!
//! Heuristics here may move a task between columns but must never empty the
//! board: anything unrecognised lands in `Scheduled` rather than vanishing.

use std::collections::BTreeMap;

use crate::board::{
    config::EligibilityConfig,
    domain::{BoardColumn, DisplayStage, TaskOverrides, TaskRecord, derive, status_column},
};

/// Raw statuses and metadata flags that remove a task from the board.
const DELETION_MARKERS: [&str; 3] = ["deleted", "voided", "cancelled"];
const PLACEHOLDER_STATUS: &str = "allocated";

/// Why a task was kept off the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suppression {
    /// The id is not a human-created task identifier.
    MalformedIdentifier,
    /// The task was deleted, voided or cancelled.
    Deleted,
    /// A terminal task would have rendered outside `Completed`.
    Misplaced,
    /// An allocated shell that was never filled in.
    PlaceholderShell,
}

/// Placement decision for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Render the task in the given column.
    Visible(BoardColumn),
    /// Keep the task off the board.
    Suppressed(Suppression),
}

impl Eligibility {
    /// Returns `true` for [`Eligibility::Visible`].
    #[must_use]
    pub const fn is_visible(self) -> bool {
        matches!(self, Self::Visible(_))
    }
}

/// Everything the filter knows about a task beyond its snapshot record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placement {
    /// Operator overrides held for the task.
    pub overrides: TaskOverrides,
    /// Column asserted by a ledger event newer than the snapshot.
    pub asserted_column: Option<BoardColumn>,
}

impl From<TaskOverrides> for Placement {
    fn from(overrides: TaskOverrides) -> Self {
        Self {
            overrides,
            asserted_column: None,
        }
    }
}

/// Visible tasks grouped by column, each in snapshot order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardView<'a> {
    columns: BTreeMap<BoardColumn, Vec<&'a TaskRecord>>,
}

impl<'a> BoardView<'a> {
    /// Returns the tasks placed in `column`.
    #[must_use]
    pub fn column(&self, column: BoardColumn) -> &[&'a TaskRecord] {
        match self.columns.get(&column) {
            Some(tasks) => tasks,
            None => &[],
        }
    }

    /// Returns the number of visible tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.values().map(Vec::len).sum()
    }

    /// Returns `true` when no task is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Governance filter deciding visibility and column placement.
#[derive(Debug, Clone, Default)]
pub struct EligibilityFilter {
    config: EligibilityConfig,
}

impl EligibilityFilter {
    /// Creates a filter.
    #[must_use]
    pub const fn new(config: EligibilityConfig) -> Self {
        Self { config }
    }

    /// Returns the filter configuration.
    #[must_use]
    pub const fn config(&self) -> &EligibilityConfig {
        &self.config
    }

    /// Returns the column a task belongs in.
    ///
    /// The ledger-asserted column wins, then a recognised status override,
    /// then the raw backend status; anything else is `Scheduled`.
    #[must_use]
    pub fn column(&self, task: &TaskRecord, overrides: &TaskOverrides) -> BoardColumn {
        self.column_with(task, overrides, None)
    }

    /// Returns the column a task belongs in, letting a column asserted by a
    /// ledger event since the last snapshot win over everything else.
    #[must_use]
    pub fn column_with(
        &self,
        task: &TaskRecord,
        overrides: &TaskOverrides,
        asserted: Option<BoardColumn>,
    ) -> BoardColumn {
        if let Some(column) = asserted.or_else(|| task.ledger_column()) {
            return column;
        }
        overrides
            .status
            .as_deref()
            .and_then(status_column)
            .or_else(|| status_column(task.raw_status()))
            .unwrap_or(BoardColumn::Scheduled)
    }

    /// Returns whether the task is rendered at all.
    #[must_use]
    pub fn is_visible(&self, task: &TaskRecord, overrides: &TaskOverrides) -> bool {
        self.assess(task, overrides).is_visible()
    }

    /// Applies the visibility checks in order and stops at the first failure.
    #[must_use]
    pub fn assess(&self, task: &TaskRecord, overrides: &TaskOverrides) -> Eligibility {
        self.assess_with(task, overrides, None)
    }

    /// Like [`Self::assess`], with a column asserted by a newer ledger event.
    #[must_use]
    pub fn assess_with(
        &self,
        task: &TaskRecord,
        overrides: &TaskOverrides,
        asserted: Option<BoardColumn>,
    ) -> Eligibility {
        if !self.is_human_identifier(task.id().as_str()) {
            return Eligibility::Suppressed(Suppression::MalformedIdentifier);
        }
        if is_deleted(task) {
            return Eligibility::Suppressed(Suppression::Deleted);
        }

        let column = self.column_with(task, overrides, asserted);
        if is_terminal(task) && column != BoardColumn::Completed {
            return Eligibility::Suppressed(Suppression::Misplaced);
        }
        if column == BoardColumn::Scheduled && self.is_placeholder(task) {
            return Eligibility::Suppressed(Suppression::PlaceholderShell);
        }
        Eligibility::Visible(column)
    }

    /// Returns the visible tasks in snapshot order.
    #[must_use]
    pub fn visible_tasks<'a, F, P>(
        &self,
        tasks: &'a [TaskRecord],
        placement_of: F,
    ) -> Vec<&'a TaskRecord>
    where
        F: Fn(&TaskRecord) -> P,
        P: Into<Placement>,
    {
        tasks
            .iter()
            .filter(|task| self.place(task, &placement_of(*task).into()).is_visible())
            .collect()
    }

    /// Groups the visible tasks by column.
    #[must_use]
    pub fn board<'a, F, P>(&self, tasks: &'a [TaskRecord], placement_of: F) -> BoardView<'a>
    where
        F: Fn(&TaskRecord) -> P,
        P: Into<Placement>,
    {
        let mut view = BoardView::default();
        for task in tasks {
            match self.place(task, &placement_of(task).into()) {
                Eligibility::Visible(column) => {
                    view.columns.entry(column).or_default().push(task);
                }
                Eligibility::Suppressed(reason) => {
                    tracing::trace!(task_id = %task.id(), reason = ?reason, "task suppressed");
                }
            }
        }
        view
    }

    fn place(&self, task: &TaskRecord, placement: &Placement) -> Eligibility {
        self.assess_with(task, &placement.overrides, placement.asserted_column)
    }

    /// Matches `<prefix>-<digits>` for one of the configured prefixes.
    fn is_human_identifier(&self, id: &str) -> bool {
        let Some((prefix, number)) = id.split_once('-') else {
            return false;
        };
        !number.is_empty()
            && number.bytes().all(|byte| byte.is_ascii_digit())
            && self
                .config
                .identifier_prefixes
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(prefix))
    }

    fn is_placeholder(&self, task: &TaskRecord) -> bool {
        task.raw_status().trim().eq_ignore_ascii_case(PLACEHOLDER_STATUS)
            && task.title().trim() == self.config.placeholder_title
    }
}

/// A task is terminal when the ledger flagged it or it derives to `Done`.
fn is_terminal(task: &TaskRecord) -> bool {
    task.is_terminal() || derive(task).stage == DisplayStage::Done
}

fn is_deleted(task: &TaskRecord) -> bool {
    let status = task.raw_status().trim().to_ascii_lowercase();
    DELETION_MARKERS.contains(&status.as_str())
        || task.deleted_at().is_some()
        || DELETION_MARKERS.iter().any(|flag| task.metadata_flag(flag))
}
