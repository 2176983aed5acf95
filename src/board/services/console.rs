//! The console context: the single owner of board state.
//!
//! One context is created per signed-in session and reset on sign-out. It
//! owns the rendered task collection, the pending-action tracker and the
//! override store, and is the only writer of all three.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::Value;

use crate::board::{
    config::ConsoleConfig,
    domain::{
        ActionId, ActionOutcome, ActionRequest, BoardColumn, DerivedState, EventId, LedgerEvent,
        OverrideField, PendingAction, ResolutionNotice, TaskKey, TaskOverrides, TaskRecord,
        derive_for_render,
    },
    ports::{KeyValueStore, ResolutionNotifier, SnapshotError, SnapshotResult, SnapshotSource},
    services::{
        BoardView, EligibilityFilter, OverrideStore, PendingActionTracker, Placement,
        ReconcileOutcome, TrackerResult, normalize_snapshot, reconcile,
    },
};

/// What handling one delivered event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventReport {
    /// The event id was already processed; nothing happened.
    Duplicate,
    /// The event had no task id; it only reached the activity feed.
    Uncorrelated,
    /// The event was correlated with its task.
    Applied {
        /// Pending actions the event resolved.
        resolutions: Vec<ResolutionNotice>,
        /// Whether a status override was dropped because the event asserted
        /// a terminal state.
        cleared_status_override: bool,
    },
}

/// Explicit state owner for one console session.
pub struct ConsoleContext<S, N, C>
where
    S: KeyValueStore,
    N: ResolutionNotifier,
    C: Clock + Send + Sync,
{
    config: ConsoleConfig,
    clock: Arc<C>,
    tasks: Vec<TaskRecord>,
    tracker: PendingActionTracker<N, C>,
    overrides: OverrideStore<S, C>,
    filter: EligibilityFilter,
    refresh_error: Option<SnapshotError>,
    last_refreshed_at: Option<DateTime<Utc>>,
    seen_order: VecDeque<EventId>,
    seen: HashSet<EventId>,
    activity: VecDeque<LedgerEvent>,
    /// Tasks an event asserted terminal that the snapshot does not yet show.
    ledger_terminal: BTreeSet<TaskKey>,
}

impl<S, N, C> ConsoleContext<S, N, C>
where
    S: KeyValueStore,
    N: ResolutionNotifier,
    C: Clock + Send + Sync,
{
    /// Creates an empty context.
    #[must_use]
    pub fn new(config: ConsoleConfig, store: Arc<S>, notifier: Arc<N>, clock: Arc<C>) -> Self {
        let tracker =
            PendingActionTracker::new(config.tracker.clone(), notifier, Arc::clone(&clock));
        let overrides = OverrideStore::new(store, Arc::clone(&clock), &config.overrides);
        let filter = EligibilityFilter::new(config.eligibility.clone());
        Self {
            config,
            clock,
            tasks: Vec::new(),
            tracker,
            overrides,
            filter,
            refresh_error: None,
            last_refreshed_at: None,
            seen_order: VecDeque::new(),
            seen: HashSet::new(),
            activity: VecDeque::new(),
            ledger_terminal: BTreeSet::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Returns the current task collection in snapshot order.
    #[must_use]
    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    /// Returns a task by key.
    #[must_use]
    pub fn task(&self, task_id: &TaskKey) -> Option<&TaskRecord> {
        self.tasks.iter().find(|task| task.id() == task_id)
    }

    /// Returns the pending-action tracker.
    #[must_use]
    pub const fn tracker(&self) -> &PendingActionTracker<N, C> {
        &self.tracker
    }

    /// Returns the override store.
    #[must_use]
    pub const fn overrides(&self) -> &OverrideStore<S, C> {
        &self.overrides
    }

    /// Returns the last refresh failure, until dismissed or a refresh
    /// succeeds.
    #[must_use]
    pub const fn refresh_error(&self) -> Option<&SnapshotError> {
        self.refresh_error.as_ref()
    }

    /// Dismisses the refresh error indicator.
    pub fn dismiss_refresh_error(&mut self) {
        self.refresh_error = None;
    }

    /// Returns when the collection was last replaced.
    #[must_use]
    pub const fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed_at
    }

    /// Returns recently delivered events, oldest first.
    #[must_use]
    pub fn activity(&self) -> impl Iterator<Item = &LedgerEvent> {
        self.activity.iter()
    }

    /// Handles one delivered ledger event.
    ///
    /// Duplicate ids are ignored. Every other event reaches the activity
    /// feed; events carrying a task id are correlated with pending actions
    /// and drop the task's status override when they assert a terminal
    /// state.
    pub fn handle_event(&mut self, event: LedgerEvent) -> EventReport {
        if !self.remember(&event.id) {
            tracing::debug!(event_id = %event.id, "duplicate event delivery ignored");
            return EventReport::Duplicate;
        }

        let report = match event.task_id.clone() {
            None => {
                tracing::debug!(event_id = %event.id, topic = %event.topic, "malformed event, not correlated");
                EventReport::Uncorrelated
            }
            Some(task_id) => {
                let resolutions = self.tracker.observe(&event);
                let terminal = event.asserts_terminal();
                let cleared_status_override =
                    terminal && self.overrides.invalidate_status(&task_id);
                if terminal {
                    self.ledger_terminal.insert(task_id);
                }
                EventReport::Applied {
                    resolutions,
                    cleared_status_override,
                }
            }
        };

        self.push_activity(event);
        report
    }

    /// Replaces the collection from a fetch result.
    ///
    /// On failure nothing is replaced: the previous collection stays visible
    /// and the error is kept for the retry indicator.
    ///
    /// # Errors
    ///
    /// Returns the fetch or normalization error.
    pub fn apply_snapshot(
        &mut self,
        fetched: SnapshotResult<Value>,
    ) -> SnapshotResult<ReconcileOutcome> {
        let normalized =
            fetched.and_then(|body| normalize_snapshot(body).map_err(SnapshotError::from));
        let batch = match normalized {
            Ok(batch) => batch,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    retryable = err.is_retryable(),
                    kept = self.tasks.len(),
                    "snapshot refresh failed, keeping current tasks"
                );
                self.refresh_error = Some(err.clone());
                return Err(err);
            }
        };

        let outcome = reconcile(&self.tasks, batch);
        self.tasks.clone_from(&outcome.tasks);
        for task in &self.tasks {
            self.overrides.invalidate_if_authoritative(task);
        }
        let tasks = &self.tasks;
        self.ledger_terminal.retain(|task_id| {
            tasks
                .iter()
                .any(|task| task.id() == task_id && !task.ledger_asserts_terminal())
        });
        self.refresh_error = None;
        self.last_refreshed_at = Some(self.clock.utc());

        tracing::info!(
            tasks = self.tasks.len(),
            ghosts = outcome.ghosts.len(),
            added = outcome.added.len(),
            duplicates = outcome.duplicates.len(),
            "task snapshot reconciled"
        );
        Ok(outcome)
    }

    /// Fetches a snapshot and applies it.
    ///
    /// # Errors
    ///
    /// Returns the fetch or normalization error; the collection is kept.
    pub async fn refresh<Src>(&mut self, source: &Src) -> SnapshotResult<ReconcileOutcome>
    where
        Src: SnapshotSource + ?Sized,
    {
        let fetched = source.fetch_snapshot().await;
        self.apply_snapshot(fetched)
    }

    /// Starts tracking an action whose submission was accepted.
    ///
    /// # Errors
    ///
    /// Returns [`crate::board::services::TrackerError`] for a missing
    /// correlation id or a duplicate pending action id.
    pub fn track_action(&mut self, request: ActionRequest) -> TrackerResult<PendingAction> {
        self.tracker.register(request)
    }

    /// Resolves an action explicitly. Late or repeated calls return `None`.
    pub fn resolve_action(
        &mut self,
        action_id: &ActionId,
        outcome: ActionOutcome,
    ) -> Option<ResolutionNotice> {
        self.tracker.resolve(action_id, outcome)
    }

    /// Fails every action whose confirmation window has elapsed.
    pub fn expire_actions(&mut self) -> Vec<ResolutionNotice> {
        self.tracker.expire_due()
    }

    /// Returns the earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.tracker.next_deadline()
    }

    /// Writes an operator override.
    ///
    /// Returns `false` without writing when the ledger is already
    /// authoritative for the task, or when the store rejected the write.
    pub fn set_override(&mut self, task_id: &TaskKey, field: OverrideField, value: Value) -> bool {
        if !self.is_editable(task_id) {
            tracing::debug!(task_id = %task_id, field = %field, "task is terminal, override refused");
            return false;
        }
        self.overrides.set(task_id, field, value)
    }

    /// Returns whether the operator may still edit a task.
    ///
    /// A task is read-only once its snapshot record or any event since that
    /// snapshot asserted a terminal state.
    #[must_use]
    pub fn is_editable(&self, task_id: &TaskKey) -> bool {
        !self.ledger_terminal.contains(task_id)
            && self
                .task(task_id)
                .is_none_or(|task| self.overrides.is_editable(task))
    }

    /// Reads an override value.
    #[must_use]
    pub fn override_value(&self, task_id: &TaskKey, field: OverrideField) -> Option<Value> {
        self.overrides.value(task_id, field)
    }

    /// Removes an override.
    pub fn clear_override(&mut self, task_id: &TaskKey, field: OverrideField) {
        self.overrides.clear(task_id, field);
    }

    /// Returns the overrides held for a task.
    #[must_use]
    pub fn overrides_for(&self, task_id: &TaskKey) -> TaskOverrides {
        self.overrides.overrides_for(task_id)
    }

    /// Returns the badge state of a task.
    #[must_use]
    pub fn derived(&self, task: &TaskRecord) -> DerivedState {
        derive_for_render(task)
    }

    /// Returns the title to render: the override while one exists,
    /// otherwise the ledger title.
    #[must_use]
    pub fn display_title(&self, task: &TaskRecord) -> String {
        self.overrides_for(task.id())
            .title
            .unwrap_or_else(|| task.title().to_owned())
    }

    /// Returns the column a task is placed in.
    #[must_use]
    pub fn column_of(&self, task: &TaskRecord) -> BoardColumn {
        let placement = self.placement_of(task);
        self.filter
            .column_with(task, &placement.overrides, placement.asserted_column)
    }

    /// Returns the visible tasks in snapshot order.
    #[must_use]
    pub fn visible_tasks(&self) -> Vec<&TaskRecord> {
        self.filter
            .visible_tasks(&self.tasks, |task| self.placement_of(task))
    }

    /// Returns the visible tasks grouped by column.
    #[must_use]
    pub fn board(&self) -> BoardView<'_> {
        self.filter
            .board(&self.tasks, |task| self.placement_of(task))
    }

    /// Drops all session state: tasks, pending actions, overrides, error
    /// indicator and event history. Called on sign-out.
    pub fn reset(&mut self) {
        tracing::info!("resetting console context");
        self.tasks.clear();
        self.tracker.reset();
        self.overrides.clear_all();
        self.refresh_error = None;
        self.last_refreshed_at = None;
        self.seen_order.clear();
        self.seen.clear();
        self.activity.clear();
        self.ledger_terminal.clear();
    }

    fn placement_of(&self, task: &TaskRecord) -> Placement {
        Placement {
            overrides: self.overrides_for(task.id()),
            asserted_column: self
                .ledger_terminal
                .contains(task.id())
                .then_some(BoardColumn::Completed),
        }
    }

    /// Records an event id; returns `false` if it was already seen.
    fn remember(&mut self, event_id: &EventId) -> bool {
        if self.seen.contains(event_id) {
            return false;
        }
        self.seen.insert(event_id.clone());
        self.seen_order.push_back(event_id.clone());
        while self.seen_order.len() > self.config.runtime.seen_event_window {
            if let Some(evicted) = self.seen_order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        true
    }

    fn push_activity(&mut self, event: LedgerEvent) {
        self.activity.push_back(event);
        while self.activity.len() > self.config.runtime.activity_feed_size {
            self.activity.pop_front();
        }
    }
}
