//! Tests for the console context.

use async_trait::async_trait;
use eyre::Result;
use mockall::mock;
use rstest::rstest;
use serde_json::{Value, json};

use super::fixtures::{Harness, TestContext, console, event_for, key};
use crate::board::{
    domain::{ActionRequest, ActionType, BoardColumn, LedgerEvent, OverrideField},
    ports::{SnapshotError, SnapshotParseError, SnapshotResult, SnapshotSource},
    services::EventReport,
};

mock! {
    Source {}

    #[async_trait]
    impl SnapshotSource for Source {
        async fn fetch_snapshot(&self) -> SnapshotResult<Value>;
    }
}

type TestConsole = Harness<TestContext>;

fn snapshot(ids: &[(&str, &str)]) -> SnapshotResult<Value> {
    let records: Vec<Value> = ids
        .iter()
        .map(|(id, status)| json!({ "id": id, "title": format!("Task {id}"), "status": status }))
        .collect();
    Ok(json!({ "data": records }))
}

#[rstest]
fn terminal_event_clears_status_override(mut console: TestConsole) {
    let id = key("T-5");
    assert!(
        console
            .subject
            .set_override(&id, OverrideField::Status, json!("blocked-by-me"))
    );

    let report = console.subject.handle_event(
        LedgerEvent::new("e1", "task.moved")
            .with_task(id.clone())
            .with_column("Completed"),
    );

    assert_eq!(
        report,
        EventReport::Applied {
            resolutions: Vec::new(),
            cleared_status_override: true,
        }
    );
    assert!(
        console
            .subject
            .override_value(&id, OverrideField::Status)
            .is_none()
    );
}

#[rstest]
fn payload_column_also_asserts_terminal(mut console: TestConsole) {
    let id = key("T-5");
    console
        .subject
        .set_override(&id, OverrideField::Status, json!("scheduled"));

    console.subject.handle_event(
        LedgerEvent::new("e1", "task.updated")
            .with_task(id.clone())
            .with_payload(json!({ "column": "completed" })),
    );

    assert!(console.subject.overrides_for(&id).status.is_none());
}

#[rstest]
fn non_terminal_event_keeps_status_override(mut console: TestConsole) {
    let id = key("T-5");
    console
        .subject
        .set_override(&id, OverrideField::Status, json!("scheduled"));

    console.subject.handle_event(
        LedgerEvent::new("e1", "task.moved")
            .with_task(id.clone())
            .with_status("running"),
    );

    assert_eq!(
        console.subject.overrides_for(&id).status.as_deref(),
        Some("scheduled")
    );
}

#[rstest]
fn terminal_event_locks_task_until_snapshot_catches_up(mut console: TestConsole) -> Result<()> {
    let id = key("T-5");
    console.subject.apply_snapshot(snapshot(&[("T-5", "running")]))?;
    console.subject.handle_event(
        LedgerEvent::new("e1", "task.moved")
            .with_task(id.clone())
            .with_column("Completed"),
    );

    assert!(!console.subject.is_editable(&id));
    assert!(
        !console
            .subject
            .set_override(&id, OverrideField::Status, json!("scheduled"))
    );
    assert!(
        !console
            .subject
            .set_override(&id, OverrideField::Title, json!("Renamed"))
    );
    assert!(console.subject.overrides_for(&id).status.is_none());
    let task = console
        .subject
        .task(&id)
        .ok_or_else(|| eyre::eyre!("T-5 should be held"))?;
    assert_eq!(console.subject.column_of(task), BoardColumn::Completed);
    assert_eq!(
        console.subject.board().column(BoardColumn::Completed).len(),
        1
    );

    console.subject.apply_snapshot(snapshot(&[("T-5", "running")]))?;
    assert!(!console.subject.is_editable(&id));

    console.subject.apply_snapshot(snapshot(&[("T-5", "completed")]))?;
    assert!(!console.subject.is_editable(&id));
    Ok(())
}

#[rstest]
fn terminal_assertion_is_forgotten_once_the_task_leaves(mut console: TestConsole) -> Result<()> {
    let id = key("T-5");
    console.subject.apply_snapshot(snapshot(&[("T-5", "running")]))?;
    console.subject.handle_event(
        LedgerEvent::new("e1", "task.moved")
            .with_task(id.clone())
            .with_status("completed"),
    );

    console.subject.apply_snapshot(snapshot(&[("T-6", "running")]))?;

    assert!(console.subject.is_editable(&id));
    Ok(())
}

#[rstest]
fn duplicate_events_are_ignored(mut console: TestConsole) -> Result<()> {
    console
        .subject
        .track_action(ActionRequest::new(ActionType::Deploy, "T-7", "Deploy").with_id("a1"))?;

    let first = console
        .subject
        .handle_event(event_for("e1", "deploy.completed", "T-7"));
    let again = console
        .subject
        .handle_event(event_for("e1", "deploy.completed", "T-7"));

    assert!(matches!(first, EventReport::Applied { ref resolutions, .. } if resolutions.len() == 1));
    assert_eq!(again, EventReport::Duplicate);
    assert_eq!(console.notifier.len(), 1);
    assert_eq!(console.subject.activity().count(), 1);
    Ok(())
}

#[rstest]
fn malformed_events_reach_only_the_activity_feed(mut console: TestConsole) {
    let report = console
        .subject
        .handle_event(LedgerEvent::new("e1", "deploy.completed"));

    assert_eq!(report, EventReport::Uncorrelated);
    assert_eq!(console.subject.activity().count(), 1);
}

#[rstest]
fn snapshot_replaces_tasks_and_clears_error(mut console: TestConsole) -> Result<()> {
    console
        .subject
        .apply_snapshot(snapshot(&[("T-1", "running"), ("T-2", "pending")]))?;
    let outcome = console
        .subject
        .apply_snapshot(snapshot(&[("T-2", "running"), ("T-3", "pending")]))?;

    let ids: Vec<&str> = console
        .subject
        .tasks()
        .iter()
        .map(|task| task.id().as_str())
        .collect();
    assert_eq!(ids, ["T-2", "T-3"]);
    assert!(outcome.ghosts.contains(&key("T-1")));
    assert!(console.subject.refresh_error().is_none());
    assert!(console.subject.last_refreshed_at().is_some());
    Ok(())
}

#[rstest]
fn failed_refresh_keeps_tasks_and_flags_error(mut console: TestConsole) -> Result<()> {
    console.subject.apply_snapshot(snapshot(&[("T-1", "running")]))?;

    let failed = console
        .subject
        .apply_snapshot(Err(SnapshotError::Transport("connection reset".to_owned())));

    assert!(failed.is_err());
    assert_eq!(console.subject.tasks().len(), 1);
    assert!(matches!(
        console.subject.refresh_error(),
        Some(SnapshotError::Transport(_))
    ));

    console.subject.dismiss_refresh_error();
    assert!(console.subject.refresh_error().is_none());
    Ok(())
}

#[rstest]
fn unparseable_body_is_a_refresh_error(mut console: TestConsole) {
    let failed = console.subject.apply_snapshot(Ok(json!({ "rows": [] })));

    assert!(matches!(
        failed,
        Err(SnapshotError::Parse(SnapshotParseError::UnsupportedShape(_)))
    ));
    assert!(console.subject.refresh_error().is_some());
}

#[rstest]
fn authoritative_snapshot_invalidates_status_override(mut console: TestConsole) -> Result<()> {
    let id = key("T-5");
    console
        .subject
        .set_override(&id, OverrideField::Status, json!("running"));

    console.subject.apply_snapshot(Ok(json!([
        { "id": "T-5", "status": "completed", "ledgerColumn": "Completed" }
    ])))?;

    assert!(console.subject.overrides_for(&id).status.is_none());
    Ok(())
}

#[rstest]
fn terminal_tasks_refuse_new_overrides(mut console: TestConsole) -> Result<()> {
    console.subject.apply_snapshot(Ok(json!([
        { "id": "T-5", "isTerminal": true, "terminalOutcome": "success" }
    ])))?;

    let written = console
        .subject
        .set_override(&key("T-5"), OverrideField::Title, json!("Renamed"));

    assert!(!written);
    assert!(console.store.is_empty());
    Ok(())
}

#[rstest]
fn board_uses_status_override_for_placement(mut console: TestConsole) -> Result<()> {
    console.subject.apply_snapshot(snapshot(&[("T-1", "pending")]))?;
    console
        .subject
        .set_override(&key("T-1"), OverrideField::Status, json!("running"));
    console
        .subject
        .set_override(&key("T-1"), OverrideField::Title, json!("Renamed"));

    let board = console.subject.board();
    let task = board
        .column(BoardColumn::InProgress)
        .first()
        .copied()
        .ok_or_else(|| eyre::eyre!("task should be in progress"))?;

    assert_eq!(console.subject.column_of(task), BoardColumn::InProgress);
    assert_eq!(console.subject.display_title(task), "Renamed");
    assert_eq!(console.subject.visible_tasks().len(), 1);
    Ok(())
}

#[rstest]
fn reset_drops_all_session_state(mut console: TestConsole) -> Result<()> {
    console.subject.apply_snapshot(snapshot(&[("T-1", "running")]))?;
    console
        .subject
        .set_override(&key("T-1"), OverrideField::Title, json!("Renamed"));
    console
        .subject
        .track_action(ActionRequest::new(ActionType::Chat, "T-1", "Reply"))?;
    console
        .subject
        .handle_event(event_for("e1", "chat.started", "T-1"));

    console.subject.reset();

    assert!(console.subject.tasks().is_empty());
    assert!(console.subject.tracker().pending().is_empty());
    assert!(console.store.is_empty());
    assert_eq!(console.subject.activity().count(), 0);
    assert!(console.notifier.is_empty());

    let replay = console
        .subject
        .handle_event(event_for("e1", "chat.started", "T-1"));
    assert_ne!(replay, EventReport::Duplicate);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn refresh_fetches_through_the_source(mut console: TestConsole) -> Result<()> {
    let mut source = MockSource::new();
    source
        .expect_fetch_snapshot()
        .times(1)
        .returning(|| snapshot(&[("T-1", "running")]));

    let outcome = console.subject.refresh(&source).await?;

    assert_eq!(outcome.added.len(), 1);
    assert_eq!(console.subject.tasks().len(), 1);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn refresh_failure_is_retryable_for_server_errors(mut console: TestConsole) {
    let mut source = MockSource::new();
    source
        .expect_fetch_snapshot()
        .times(1)
        .returning(|| Err(SnapshotError::Status { code: 503 }));

    let failed = console.subject.refresh(&source).await;

    assert!(failed.is_err_and(|err| err.is_retryable()));
    assert!(console.subject.refresh_error().is_some());
}
