//! Ledger events and their classification into recognised categories.

use super::{BoardColumn, EventId, TaskKey, status_column};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One record delivered by the ledger event stream.
///
/// Events are immutable once delivered and may arrive out of order,
/// duplicated, or not at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Ledger-assigned event identifier.
    pub id: EventId,
    /// Event topic, for example `deploy.completed`.
    pub topic: String,
    /// Task the event refers to, when the ledger supplied one.
    ///
    /// A blank id deserializes as absent, so the event is treated as
    /// malformed rather than rejected.
    #[serde(
        default,
        alias = "taskId",
        deserialize_with = "lenient_task_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_id: Option<TaskKey>,
    /// Task status asserted by the event, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Board column asserted by the event, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Ledger timestamp of the event.
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Opaque event payload.
    #[serde(default)]
    pub payload: Value,
}

impl LedgerEvent {
    /// Creates an event with only an id and topic.
    #[must_use]
    pub fn new(id: impl Into<EventId>, topic: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            task_id: None,
            status: None,
            column: None,
            created_at: None,
            payload: Value::Null,
        }
    }

    /// Sets the correlated task.
    #[must_use]
    pub fn with_task(mut self, task_id: TaskKey) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Sets the asserted task status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the asserted board column.
    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Returns the board column asserted by the event.
    ///
    /// Reads the top-level `column` first and falls back to `payload.column`.
    #[must_use]
    pub fn asserted_column(&self) -> Option<BoardColumn> {
        let from_payload = || self.payload.get("column").and_then(Value::as_str);
        self.column
            .as_deref()
            .or_else(from_payload)
            .and_then(|label| BoardColumn::try_from(label).ok())
    }

    /// Returns `true` when the event asserts that its task reached a terminal
    /// state, either through a `Completed` column or a terminal status.
    #[must_use]
    pub fn asserts_terminal(&self) -> bool {
        if self.asserted_column() == Some(BoardColumn::Completed) {
            return true;
        }
        self.status
            .as_deref()
            .and_then(status_column)
            .is_some_and(|column| column == BoardColumn::Completed)
    }
}

fn lenient_task_key<'de, D>(deserializer: D) -> Result<Option<TaskKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| TaskKey::new(value).ok()))
}

/// Closed set of event categories the action tracker reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// The ledger confirms an action succeeded.
    Success,
    /// The ledger reports an action failed or was rejected.
    Failure,
    /// Intermediate progress; never resolves an action.
    Progress,
    /// Topic not covered by any configured pattern.
    Unrecognized,
}

/// How a configured topic pattern is compared with an event topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "value", rename_all = "snake_case")]
pub enum TopicPattern {
    /// Case-insensitive equality.
    Exact(String),
    /// Case-insensitive substring.
    Contains(String),
    /// Case-insensitive equality with one topic segment, where segments are
    /// separated by `.`, `_`, `-`, `:` or `/`.
    Segment(String),
}

impl TopicPattern {
    /// Returns `true` when the (already lowercased) topic matches.
    fn matches(&self, lowered_topic: &str) -> bool {
        match self {
            Self::Exact(expected) => lowered_topic == expected.to_ascii_lowercase(),
            Self::Contains(fragment) => lowered_topic.contains(&fragment.to_ascii_lowercase()),
            Self::Segment(expected) => {
                let expected_lower = expected.to_ascii_lowercase();
                lowered_topic
                    .split(TOPIC_SEPARATORS)
                    .any(|segment| segment == expected_lower)
            }
        }
    }
}

/// Separators between the segments of an event topic.
const TOPIC_SEPARATORS: [char; 5] = ['.', '_', '-', ':', '/'];

/// Classifies raw event topics into [`EventCategory`] values.
///
/// Failure patterns are checked before success patterns so that a topic such
/// as `deploy.completed_with_errors` never reads as a success. The default
/// success patterns match whole segments only, so `deploy.unsuccessful` is
/// not a success.
///
/// # Examples
///
/// ```
/// use ledgerboard::board::domain::{EventCategory, TopicClassifier};
///
/// let classifier = TopicClassifier::default();
/// assert_eq!(classifier.classify("Deploy.Completed"), EventCategory::Success);
/// assert_eq!(classifier.classify("approval.rejected"), EventCategory::Failure);
/// assert_eq!(classifier.classify("deploy.unsuccessful"), EventCategory::Failure);
/// assert_eq!(classifier.classify("heartbeat"), EventCategory::Unrecognized);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicClassifier {
    /// Patterns recognised as success confirmations.
    pub success: Vec<TopicPattern>,
    /// Patterns recognised as failures.
    pub failure: Vec<TopicPattern>,
    /// Patterns recognised as progress.
    #[serde(default)]
    pub progress: Vec<TopicPattern>,
}

impl TopicClassifier {
    /// Classifies an event topic.
    #[must_use]
    pub fn classify(&self, topic: &str) -> EventCategory {
        let lowered = topic.trim().to_ascii_lowercase();
        let any = |patterns: &[TopicPattern]| patterns.iter().any(|p| p.matches(&lowered));
        if any(&self.failure) {
            EventCategory::Failure
        } else if any(&self.success) {
            EventCategory::Success
        } else if any(&self.progress) {
            EventCategory::Progress
        } else {
            EventCategory::Unrecognized
        }
    }
}

impl Default for TopicClassifier {
    fn default() -> Self {
        let patterns = |make: fn(String) -> TopicPattern, fragments: &[&str]| -> Vec<TopicPattern> {
            fragments
                .iter()
                .map(|fragment| make((*fragment).to_owned()))
                .collect()
        };
        Self {
            success: patterns(
                TopicPattern::Segment,
                &[
                    "completed",
                    "succeeded",
                    "success",
                    "approved",
                    "activated",
                    "deployed",
                    "replied",
                ],
            ),
            failure: patterns(
                TopicPattern::Contains,
                &[
                    "failed",
                    "failure",
                    "rejected",
                    "error",
                    "denied",
                    "cancelled",
                    "blocked",
                    "unsuccessful",
                    "not_approved",
                    "not.approved",
                    "unapproved",
                    "declined",
                    "aborted",
                    "timed_out",
                ],
            ),
            progress: patterns(
                TopicPattern::Contains,
                &["started", "progress", "claimed", "queued", "running"],
            ),
        }
    }
}
