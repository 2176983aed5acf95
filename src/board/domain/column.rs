//! Board columns and the fixed status-to-column lookup.

use super::ParseBoardColumnError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column a task is rendered in on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BoardColumn {
    /// Work that has not started.
    Scheduled,
    /// Work currently moving through the pipeline.
    #[serde(rename = "In-Progress", alias = "in_progress", alias = "InProgress")]
    InProgress,
    /// Work the ledger considers finished, successfully or not.
    Completed,
}

impl BoardColumn {
    /// All columns in display order.
    pub const ALL: [Self; 3] = [Self::Scheduled, Self::InProgress, Self::Completed];

    /// Returns the display label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::InProgress => "In-Progress",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for BoardColumn {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for BoardColumn {
    type Error = ParseBoardColumnError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "scheduled" => Ok(Self::Scheduled),
            "in_progress" | "inprogress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseBoardColumnError(value.to_owned())),
        }
    }
}

/// Maps a raw backend status onto a board column.
///
/// Returns `None` for statuses outside the fixed lookup; callers place those
/// in [`BoardColumn::Scheduled`].
#[must_use]
pub fn status_column(status: &str) -> Option<BoardColumn> {
    let normalized = status.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "scheduled" | "pending" | "created" | "registered" => Some(BoardColumn::Scheduled),
        "in_progress" | "executing" | "running" => Some(BoardColumn::InProgress),
        "deployed" | "completed" | "success" | "failed" | "blocked" | "cancelled" => {
            Some(BoardColumn::Completed)
        }
        _ => None,
    }
}
