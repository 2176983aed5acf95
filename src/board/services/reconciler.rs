//! Full-replace reconciliation of task snapshots.
//!
//! A refresh is treated as the complete truth for its scope: the new
//! collection is exactly the fresh batch keyed by id. Nothing from the
//! previous collection survives unless the batch contains it again.

use std::collections::{BTreeSet, HashMap};

use crate::board::domain::{TaskKey, TaskRecord};

/// Result of reconciling a fresh batch against the rendered collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    /// The replacement collection, in first-seen batch order.
    pub tasks: Vec<TaskRecord>,
    /// Ids present before and absent from the batch.
    pub ghosts: BTreeSet<TaskKey>,
    /// Ids absent before and present in the batch.
    pub added: BTreeSet<TaskKey>,
    /// Ids that appeared more than once within the batch.
    pub duplicates: BTreeSet<TaskKey>,
}

impl ReconcileOutcome {
    /// Returns `true` when the batch changed the set of ids.
    #[must_use]
    pub fn changed_membership(&self) -> bool {
        !self.ghosts.is_empty() || !self.added.is_empty()
    }

    /// Returns the ids of the replacement collection.
    #[must_use]
    pub fn ids(&self) -> BTreeSet<TaskKey> {
        self.tasks.iter().map(|task| task.id().clone()).collect()
    }
}

/// Replaces `existing` with `fresh_batch`.
///
/// Intra-batch duplicates resolve last-write-wins while keeping the position
/// of the first occurrence.
///
/// # Examples
///
/// ```
/// use ledgerboard::board::domain::{TaskKey, TaskRecord};
/// use ledgerboard::board::services::reconcile;
///
/// let task = |id: &str| TaskRecord::new(TaskKey::new(id).expect("valid key"), id);
/// let outcome = reconcile(&[task("T-1"), task("T-2")], vec![task("T-2"), task("T-3")]);
/// let ids: Vec<&str> = outcome.tasks.iter().map(|t| t.id().as_str()).collect();
/// assert_eq!(ids, ["T-2", "T-3"]);
/// assert!(outcome.ghosts.contains(&TaskKey::new("T-1").expect("valid key")));
/// ```
#[must_use]
pub fn reconcile(existing: &[TaskRecord], fresh_batch: Vec<TaskRecord>) -> ReconcileOutcome {
    let mut positions: HashMap<TaskKey, usize> = HashMap::with_capacity(fresh_batch.len());
    let mut tasks: Vec<TaskRecord> = Vec::with_capacity(fresh_batch.len());
    let mut duplicates = BTreeSet::new();

    for task in fresh_batch {
        if let Some(&position) = positions.get(task.id()) {
            duplicates.insert(task.id().clone());
            if let Some(slot) = tasks.get_mut(position) {
                *slot = task;
            }
        } else {
            positions.insert(task.id().clone(), tasks.len());
            tasks.push(task);
        }
    }

    let previous: BTreeSet<&TaskKey> = existing.iter().map(TaskRecord::id).collect();
    let ghosts = previous
        .iter()
        .filter(|id| !positions.contains_key(**id))
        .map(|id| (*id).clone())
        .collect();
    let added = positions
        .keys()
        .filter(|id| !previous.contains(id))
        .cloned()
        .collect();

    ReconcileOutcome {
        tasks,
        ghosts,
        added,
        duplicates,
    }
}
