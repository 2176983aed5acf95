//! Port for fetching full task snapshots from the backend.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Result type for snapshot fetches.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Source of full task snapshots.
///
/// The response body is returned undecoded; the console normalizes the
/// tolerated wrapping shapes before reconciliation.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetches the complete task snapshot for the console's scope.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when the request fails in transport or the
    /// backend answers with an error status.
    async fn fetch_snapshot(&self) -> SnapshotResult<Value>;
}

/// Errors raised while fetching or decoding a snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SnapshotError {
    /// The request never produced a response.
    #[error("snapshot transport failure: {0}")]
    Transport(String),

    /// The backend answered with an error status.
    #[error("snapshot request failed with status {code}")]
    Status {
        /// HTTP-style status code.
        code: u16,
    },

    /// The response body did not match any tolerated shape.
    #[error(transparent)]
    Parse(#[from] SnapshotParseError),
}

impl SnapshotError {
    /// Returns `true` for failures worth retrying from the error banner.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { code } => *code >= 500 || *code == 429,
            Self::Parse(_) => false,
        }
    }
}

/// Errors raised while normalizing a snapshot body into task records.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SnapshotParseError {
    /// The body is neither a list nor a `data`/`items` wrapper.
    #[error("unsupported snapshot shape: {0}")]
    UnsupportedShape(String),

    /// A record could not be decoded.
    #[error("invalid task record at index {index}: {message}")]
    InvalidRecord {
        /// Position of the record in the batch.
        index: usize,
        /// Decoder diagnostic.
        message: String,
    },
}
