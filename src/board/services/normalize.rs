//! Normalization of snapshot responses into task records.
//!
//! The backend has answered with a bare list, `{ "data": [...] }` and
//! `{ "items": [...] }` over time. All three shapes are accepted here so the
//! reconciler only ever sees typed records.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::board::{
    domain::{BoardColumn, LedgerStage, TaskKey, TaskRecord, TerminalOutcome},
    ports::SnapshotParseError,
};

/// Wire shape of one task record, tolerant of missing and legacy fields.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireTask {
    id: Value,
    title: Option<String>,
    #[serde(alias = "rawStatus", alias = "raw_status")]
    status: Option<String>,
    #[serde(alias = "ledgerColumn", alias = "column")]
    ledger_column: Option<String>,
    #[serde(alias = "ledgerStage", alias = "stage")]
    ledger_stage: Option<String>,
    #[serde(alias = "isTerminal")]
    is_terminal: Option<bool>,
    #[serde(alias = "terminalOutcome")]
    terminal_outcome: Option<String>,
    #[serde(alias = "createdAt")]
    created_at: Option<String>,
    #[serde(alias = "updatedAt")]
    updated_at: Option<String>,
    #[serde(alias = "deletedAt")]
    deleted_at: Option<String>,
    metadata: Option<Map<String, Value>>,
}

/// Extracts task records from a snapshot response body.
///
/// # Errors
///
/// Returns [`SnapshotParseError::UnsupportedShape`] when the body is not one
/// of the tolerated shapes, and [`SnapshotParseError::InvalidRecord`] when a
/// record is not an object or has no usable identifier.
///
/// # Examples
///
/// ```
/// use ledgerboard::board::services::normalize_snapshot;
/// use serde_json::json;
///
/// let body = json!({ "items": [{ "id": "T-1", "status": "running" }] });
/// let tasks = normalize_snapshot(body).expect("tolerated shape");
/// assert_eq!(tasks.len(), 1);
/// ```
pub fn normalize_snapshot(body: Value) -> Result<Vec<TaskRecord>, SnapshotParseError> {
    let records = match body {
        Value::Array(records) => records,
        Value::Object(mut wrapper) => match wrapper
            .remove("data")
            .or_else(|| wrapper.remove("items"))
        {
            Some(Value::Array(records)) => records,
            Some(other) => return Err(unsupported(&other)),
            None => {
                return Err(SnapshotParseError::UnsupportedShape(
                    "object without data or items".to_owned(),
                ));
            }
        },
        other => return Err(unsupported(&other)),
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| parse_record(index, record))
        .collect()
}

fn unsupported(value: &Value) -> SnapshotParseError {
    let kind = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    SnapshotParseError::UnsupportedShape(kind.to_owned())
}

fn parse_record(index: usize, record: Value) -> Result<TaskRecord, SnapshotParseError> {
    let invalid = |message: String| SnapshotParseError::InvalidRecord { index, message };

    let wire: WireTask = serde_json::from_value(record).map_err(|err| invalid(err.to_string()))?;
    let raw_id = match &wire.id {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => return Err(invalid("missing id".to_owned())),
    };
    let id = TaskKey::new(raw_id).map_err(|err| invalid(err.to_string()))?;

    let mut task = TaskRecord::new(id, wire.title.unwrap_or_default())
        .with_raw_status(wire.status.unwrap_or_default())
        .with_timestamps(
            parse_timestamp(wire.created_at.as_deref()),
            parse_timestamp(wire.updated_at.as_deref()),
        );

    if let Some(column) = wire
        .ledger_column
        .as_deref()
        .and_then(|label| BoardColumn::try_from(label).ok())
    {
        task = task.with_ledger_column(column);
    }
    if let Some(stage) = wire
        .ledger_stage
        .as_deref()
        .and_then(|label| LedgerStage::try_from(label).ok())
    {
        task = task.with_ledger_stage(stage);
    }
    if wire.is_terminal.unwrap_or(false) {
        let outcome = wire.terminal_outcome.as_deref().and_then(TerminalOutcome::parse);
        task = task.with_terminal(outcome);
    }
    if let Some(deleted_at) = parse_timestamp(wire.deleted_at.as_deref()) {
        task = task.with_deleted_at(deleted_at);
    }
    if let Some(metadata) = wire.metadata {
        task = task.with_metadata(metadata);
    }
    Ok(task)
}

/// Parses an RFC 3339 timestamp, treating anything unreadable as absent.
fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let text = raw?.trim();
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}
