//! Domain model for the reconciliation core.
//!
//! Everything here is pure: records delivered by the ledger, the derived
//! display state, operator overrides, and the pending-action state machine.
//! Infrastructure concerns live behind the ports in [`crate::board::ports`].

mod action;
mod column;
mod derivation;
mod error;
mod event;
mod ids;
mod overrides;
mod task;

pub use action::{
    ActionOutcome, ActionRequest, ActionState, ActionType, FailureReason, PendingAction,
    ResolutionNotice, TIMEOUT_REASON,
};
pub use column::{BoardColumn, status_column};
pub use derivation::{DerivedState, DisplayStage, DisplayStatus, derive, derive_for_render};
pub use error::{
    BoardDomainError, ParseActionTypeError, ParseBoardColumnError, ParseLedgerStageError,
    ParseOverrideFieldError,
};
pub use event::{EventCategory, LedgerEvent, TopicClassifier, TopicPattern};
pub use ids::{ActionId, EventId, TaskKey};
pub use overrides::{Override, OverrideField, TaskOverrides};
pub use task::{LedgerStage, TaskRecord, TerminalOutcome};
