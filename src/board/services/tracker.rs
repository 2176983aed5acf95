//! Pending action tracking.
//!
//! Every action the operator submits is held as `Loading` until a correlated
//! ledger event confirms or rejects it, or until its deadline passes. The
//! tracker never infers success: silence always ends in a timeout failure.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use thiserror::Error;

use crate::board::{
    config::{SharedCorrelationPolicy, TrackerConfig},
    domain::{
        ActionId, ActionOutcome, ActionRequest, BoardDomainError, EventCategory, FailureReason,
        LedgerEvent, PendingAction, ResolutionNotice,
    },
    ports::ResolutionNotifier,
};

/// Errors raised for programmer mistakes when registering actions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrackerError {
    /// The request carries no correlation task id, so it could never resolve
    /// through the ledger.
    #[error("pending action requires a correlation task id")]
    MissingCorrelation,

    /// An action with the same id is still pending.
    #[error("action already pending: {0}")]
    DuplicateAction(ActionId),
}

/// Result type for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Tracks client-initiated actions until the ledger settles them.
pub struct PendingActionTracker<N, C>
where
    N: ResolutionNotifier,
    C: Clock + Send + Sync,
{
    config: TrackerConfig,
    notifier: Arc<N>,
    clock: Arc<C>,
    pending: Vec<PendingAction>,
    history: VecDeque<ResolutionNotice>,
}

impl<N, C> PendingActionTracker<N, C>
where
    N: ResolutionNotifier,
    C: Clock + Send + Sync,
{
    /// Creates an empty tracker.
    #[must_use]
    pub fn new(config: TrackerConfig, notifier: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            config,
            notifier,
            clock,
            pending: Vec::new(),
            history: VecDeque::new(),
        }
    }

    /// Starts tracking a submitted action and arms its deadline.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MissingCorrelation`] for a blank correlation
    /// id and [`TrackerError::DuplicateAction`] when the id is already
    /// pending.
    pub fn register(&mut self, request: ActionRequest) -> TrackerResult<PendingAction> {
        if let Some(id) = request.id()
            && self.is_pending(id)
        {
            return Err(TrackerError::DuplicateAction(id.clone()));
        }

        let action = PendingAction::start(request, self.config.default_timeout(), &*self.clock)
            .map_err(|_| TrackerError::MissingCorrelation)?;

        if self
            .pending
            .iter()
            .any(|other| other.correlation_task_id() == action.correlation_task_id())
        {
            tracing::debug!(
                action_id = %action.id(),
                task_id = %action.correlation_task_id(),
                policy = ?self.config.shared_correlation,
                "another action is already pending for this task"
            );
        }
        tracing::info!(
            action_id = %action.id(),
            action_type = %action.action_type(),
            task_id = %action.correlation_task_id(),
            timeout_ms = u64::try_from(action.timeout().as_millis()).unwrap_or(u64::MAX),
            "tracking pending action"
        );

        self.pending.push(action.clone());
        Ok(action)
    }

    /// Correlates a ledger event with the pending actions of its task.
    ///
    /// Only success and failure categories resolve actions. Events without
    /// a task id are ignored. Returns the notices emitted.
    pub fn observe(&mut self, event: &LedgerEvent) -> Vec<ResolutionNotice> {
        let Some(task_id) = event.task_id.as_ref() else {
            tracing::debug!(event_id = %event.id, topic = %event.topic, "event without task id, not correlated");
            return Vec::new();
        };

        let outcome = match self.config.topics.classify(&event.topic) {
            EventCategory::Success => ActionOutcome::confirmed(Some(event.id.clone())),
            EventCategory::Failure => ActionOutcome::failed(
                FailureReason::Rejected {
                    topic: event.topic.clone(),
                },
                Some(event.id.clone()),
            ),
            EventCategory::Progress | EventCategory::Unrecognized => return Vec::new(),
        };

        let mut matching = self
            .pending
            .iter()
            .filter(|action| action.correlation_task_id() == task_id)
            .map(|action| action.id().clone());
        let targets: Vec<ActionId> = match self.config.shared_correlation {
            SharedCorrelationPolicy::ResolveAll => matching.collect(),
            SharedCorrelationPolicy::OldestOnly => matching.next().into_iter().collect(),
        };

        targets
            .into_iter()
            .filter_map(|action_id| self.resolve(&action_id, outcome.clone()))
            .collect()
    }

    /// Applies the terminal transition of a pending action.
    ///
    /// Returns `None` when the action is unknown or already resolved; late
    /// and repeated calls are no-ops and emit nothing.
    pub fn resolve(
        &mut self,
        action_id: &ActionId,
        outcome: ActionOutcome,
    ) -> Option<ResolutionNotice> {
        let position = self
            .pending
            .iter()
            .position(|action| action.id() == action_id)?;
        let mut action = self.pending.remove(position);

        match action.resolve(outcome, &*self.clock) {
            Ok(notice) => {
                self.record(&notice);
                Some(notice)
            }
            Err(BoardDomainError::InvalidActionTransition { from, .. }) => {
                tracing::warn!(action_id = %action_id, state = %from, "dropping already resolved action");
                None
            }
            Err(err) => {
                tracing::warn!(action_id = %action_id, error = %err, "unexpected resolution failure");
                None
            }
        }
    }

    /// Fails every action whose deadline has passed.
    pub fn expire_due(&mut self) -> Vec<ResolutionNotice> {
        let now = self.clock.utc();
        let due: Vec<ActionId> = self
            .pending
            .iter()
            .filter(|action| action.is_due(now))
            .map(|action| action.id().clone())
            .collect();

        due.into_iter()
            .filter_map(|action_id| self.resolve(&action_id, ActionOutcome::timed_out()))
            .collect()
    }

    /// Returns the earliest armed deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.pending.iter().map(PendingAction::deadline).min()
    }

    /// Returns the pending actions in registration order.
    #[must_use]
    pub fn pending(&self) -> &[PendingAction] {
        &self.pending
    }

    /// Returns a pending action by id.
    #[must_use]
    pub fn get(&self, action_id: &ActionId) -> Option<&PendingAction> {
        self.pending.iter().find(|action| action.id() == action_id)
    }

    /// Returns `true` while the action awaits confirmation.
    #[must_use]
    pub fn is_pending(&self, action_id: &ActionId) -> bool {
        self.get(action_id).is_some()
    }

    /// Returns the most recent resolution notices, newest last.
    #[must_use]
    pub fn recent_resolutions(&self) -> impl Iterator<Item = &ResolutionNotice> {
        self.history.iter()
    }

    /// Discards all tracking state without emitting notices.
    ///
    /// Used when the operator signs out and the console context is reset.
    pub fn reset(&mut self) {
        if !self.pending.is_empty() {
            tracing::info!(count = self.pending.len(), "discarding pending actions on reset");
        }
        self.pending.clear();
        self.history.clear();
    }

    fn record(&mut self, notice: &ResolutionNotice) {
        if notice.success {
            tracing::info!(action_id = %notice.action_id, "pending action confirmed by ledger");
        } else if let Some(reason) = &notice.failure_reason {
            tracing::warn!(action_id = %notice.action_id, reason = %reason, "pending action failed");
        }

        self.notifier.notify(notice);
        self.history.push_back(notice.clone());
        while self.history.len() > self.config.history_size {
            self.history.pop_front();
        }
    }
}
