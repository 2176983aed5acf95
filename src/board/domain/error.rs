//! Error types for board domain validation and parsing.

use super::{ActionId, ActionState};
use thiserror::Error;

/// Errors returned while constructing or mutating board domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardDomainError {
    /// A task key was empty after trimming.
    #[error("task key must not be empty")]
    EmptyTaskKey,

    /// A pending action was asked to leave a terminal state.
    #[error("action {action_id} cannot transition from {from} to {to}")]
    InvalidActionTransition {
        /// The action being resolved.
        action_id: ActionId,
        /// The current state.
        from: ActionState,
        /// The attempted target state.
        to: ActionState,
    },
}

/// Error returned while parsing a board column label.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown board column: {0}")]
pub struct ParseBoardColumnError(pub String);

/// Error returned while parsing a ledger stage label.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown ledger stage: {0}")]
pub struct ParseLedgerStageError(pub String);

/// Error returned while parsing an action type label.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown action type: {0}")]
pub struct ParseActionTypeError(pub String);

/// Error returned while parsing an override field label.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown override field: {0}")]
pub struct ParseOverrideFieldError(pub String);
