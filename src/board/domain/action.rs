//! Client-initiated actions awaiting confirmation from the ledger.
//!
//! Transport success of a submission is not business success. A
//! [`PendingAction`] stays `Loading` until a correlated ledger event confirms
//! or rejects it, or until its deadline passes.

use super::{ActionId, BoardDomainError, EventId, ParseActionTypeError, TaskKey};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Reason recorded when an action times out.
pub const TIMEOUT_REASON: &str = "timeout, no confirmation received";

/// Kind of state-changing action submitted by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Deploy a finished task.
    Deploy,
    /// Approve or reject a governance gate.
    Approval,
    /// Activate a scheduled task.
    Activation,
    /// Send a chat instruction to an agent.
    Chat,
}

impl ActionType {
    /// Returns the canonical label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deploy => "deploy",
            Self::Approval => "approval",
            Self::Activation => "activation",
            Self::Chat => "chat",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ActionType {
    type Error = ParseActionTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "deploy" => Ok(Self::Deploy),
            "approval" => Ok(Self::Approval),
            "activation" => Ok(Self::Activation),
            "chat" => Ok(Self::Chat),
            _ => Err(ParseActionTypeError(value.to_owned())),
        }
    }
}

/// Lifecycle state of a pending action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionState {
    /// Submitted and awaiting ledger confirmation.
    Loading,
    /// Confirmed by the ledger.
    Success,
    /// Rejected by the ledger or timed out.
    Failure,
}

impl ActionState {
    /// Returns the canonical label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    /// Returns `true` for `Success` and `Failure`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }

    /// Returns whether transition to `target` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Loading, Self::Success | Self::Failure)
        )
    }
}

impl fmt::Display for ActionState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Why an action ended in failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// No confirming event arrived before the deadline.
    Timeout,
    /// The ledger reported a failure for the correlated task.
    Rejected {
        /// Topic of the rejecting event.
        topic: String,
    },
    /// A caller-supplied diagnostic.
    Other {
        /// Human-readable message.
        message: String,
    },
}

impl FailureReason {
    /// Returns `true` for [`FailureReason::Timeout`].
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => formatter.write_str(TIMEOUT_REASON),
            Self::Rejected { topic } => write!(formatter, "ledger reported failure ({topic})"),
            Self::Other { message } => formatter.write_str(message),
        }
    }
}

/// Terminal outcome applied to a pending action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The ledger confirmed the action.
    Confirmed {
        /// The confirming event, when resolution came from the stream.
        confirming_event_id: Option<EventId>,
    },
    /// The action failed.
    Failed {
        /// Diagnostic for the operator.
        reason: FailureReason,
        /// The rejecting event, when resolution came from the stream.
        confirming_event_id: Option<EventId>,
    },
}

impl ActionOutcome {
    /// Creates a confirmation outcome.
    #[must_use]
    pub const fn confirmed(confirming_event_id: Option<EventId>) -> Self {
        Self::Confirmed {
            confirming_event_id,
        }
    }

    /// Creates a failure outcome.
    #[must_use]
    pub const fn failed(reason: FailureReason, confirming_event_id: Option<EventId>) -> Self {
        Self::Failed {
            reason,
            confirming_event_id,
        }
    }

    /// Creates the timeout failure outcome.
    #[must_use]
    pub const fn timed_out() -> Self {
        Self::failed(FailureReason::Timeout, None)
    }

    const fn target_state(&self) -> ActionState {
        match self {
            Self::Confirmed { .. } => ActionState::Success,
            Self::Failed { .. } => ActionState::Failure,
        }
    }
}

/// Submission details handed to the tracker after transport success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    id: Option<ActionId>,
    action_type: ActionType,
    correlation_task_id: String,
    description: String,
    timeout: Option<Duration>,
}

impl ActionRequest {
    /// Creates a request correlated with the given task.
    #[must_use]
    pub fn new(
        action_type: ActionType,
        correlation_task_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            action_type,
            correlation_task_id: correlation_task_id.into(),
            description: description.into(),
            timeout: None,
        }
    }

    /// Uses a caller-supplied action identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ActionId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Overrides the configured confirmation window.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the caller-supplied identifier, if any.
    #[must_use]
    pub const fn id(&self) -> Option<&ActionId> {
        self.id.as_ref()
    }

    /// Returns the raw correlation task identifier.
    #[must_use]
    pub fn correlation_task_id(&self) -> &str {
        &self.correlation_task_id
    }

    /// Returns the requested timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// An action the ledger has not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingAction {
    id: ActionId,
    action_type: ActionType,
    correlation_task_id: TaskKey,
    description: String,
    started_at: DateTime<Utc>,
    timeout: Duration,
    state: ActionState,
    resolved_at: Option<DateTime<Utc>>,
    failure_reason: Option<FailureReason>,
    confirming_event_id: Option<EventId>,
}

impl PendingAction {
    /// Starts tracking a request in the `Loading` state.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::EmptyTaskKey`] when the request carries no
    /// correlation task identifier.
    pub fn start(
        request: ActionRequest,
        default_timeout: Duration,
        clock: &impl Clock,
    ) -> Result<Self, BoardDomainError> {
        let correlation_task_id = TaskKey::new(request.correlation_task_id)?;
        Ok(Self {
            id: request.id.unwrap_or_else(ActionId::generate),
            action_type: request.action_type,
            correlation_task_id,
            description: request.description,
            started_at: clock.utc(),
            timeout: request.timeout.unwrap_or(default_timeout),
            state: ActionState::Loading,
            resolved_at: None,
            failure_reason: None,
            confirming_event_id: None,
        })
    }

    /// Returns the action identifier.
    #[must_use]
    pub const fn id(&self) -> &ActionId {
        &self.id
    }

    /// Returns the action type.
    #[must_use]
    pub const fn action_type(&self) -> ActionType {
        self.action_type
    }

    /// Returns the task whose events confirm this action.
    #[must_use]
    pub const fn correlation_task_id(&self) -> &TaskKey {
        &self.correlation_task_id
    }

    /// Returns the operator-facing description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns when tracking started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the confirmation window.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> ActionState {
        self.state
    }

    /// Returns when the action reached a terminal state.
    #[must_use]
    pub const fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Returns the failure reason of a failed action.
    #[must_use]
    pub const fn failure_reason(&self) -> Option<&FailureReason> {
        self.failure_reason.as_ref()
    }

    /// Returns the event that resolved the action, if any.
    #[must_use]
    pub const fn confirming_event_id(&self) -> Option<&EventId> {
        self.confirming_event_id.as_ref()
    }

    /// Returns the instant after which the action times out.
    #[must_use]
    pub fn deadline(&self) -> DateTime<Utc> {
        let window = TimeDelta::from_std(self.timeout).unwrap_or(TimeDelta::MAX);
        self.started_at
            .checked_add_signed(window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Returns `true` once `now` has reached the deadline.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline()
    }

    /// Applies the single permitted terminal transition.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::InvalidActionTransition`] when the action
    /// has already been resolved.
    pub fn resolve(
        &mut self,
        outcome: ActionOutcome,
        clock: &impl Clock,
    ) -> Result<ResolutionNotice, BoardDomainError> {
        let target = outcome.target_state();
        if !self.state.can_transition_to(target) {
            return Err(BoardDomainError::InvalidActionTransition {
                action_id: self.id.clone(),
                from: self.state,
                to: target,
            });
        }

        match outcome {
            ActionOutcome::Confirmed {
                confirming_event_id,
            } => {
                self.confirming_event_id = confirming_event_id;
            }
            ActionOutcome::Failed {
                reason,
                confirming_event_id,
            } => {
                self.failure_reason = Some(reason);
                self.confirming_event_id = confirming_event_id;
            }
        }
        self.state = target;
        self.resolved_at = Some(clock.utc());
        Ok(ResolutionNotice::from_action(self))
    }
}

/// Notification emitted on every terminal transition of a pending action.
///
/// Consumed by toast and activity-feed collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionNotice {
    /// The resolved action.
    pub action_id: ActionId,
    /// The kind of action.
    pub action_type: ActionType,
    /// The correlated task.
    pub correlation_task_id: TaskKey,
    /// Operator-facing description.
    pub description: String,
    /// Whether the ledger confirmed the action.
    pub success: bool,
    /// Diagnostic for failed actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
    /// Event that resolved the action, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirming_event_id: Option<EventId>,
    /// When the action was resolved.
    pub resolved_at: DateTime<Utc>,
}

impl ResolutionNotice {
    fn from_action(action: &PendingAction) -> Self {
        Self {
            action_id: action.id.clone(),
            action_type: action.action_type,
            correlation_task_id: action.correlation_task_id.clone(),
            description: action.description.clone(),
            success: action.state == ActionState::Success,
            failure_reason: action.failure_reason.clone(),
            confirming_event_id: action.confirming_event_id.clone(),
            resolved_at: action.resolved_at.unwrap_or(action.started_at),
        }
    }
}
