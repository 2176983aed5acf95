//! Runtime tests driving the console through its event loop.
//!
//! Time is paused, so deadlines and refresh ticks advance deterministically.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use eyre::{Result, eyre};
use ledgerboard::board::{
    adapters::{
        ChannelEventSource, ChannelNotifier, InMemoryKeyValueStore, InMemorySnapshotSource,
        TokioClock,
    },
    config::{ConsoleConfig, RuntimeConfig},
    domain::{
        ActionRequest, ActionType, FailureReason, LedgerEvent, OverrideField, ResolutionNotice,
        TaskKey,
    },
    ports::SnapshotError,
    services::{ConsoleCommand, ConsoleContext, ConsoleHandle, ConsoleRuntime},
};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};

struct Rig {
    source: Arc<InMemorySnapshotSource>,
    events: mpsc::Sender<LedgerEvent>,
    notices: mpsc::UnboundedReceiver<ResolutionNotice>,
    handle: ConsoleHandle,
    stop: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<TestContext>,
}

fn start(refresh_interval_ms: u64) -> Rig {
    let start = Utc
        .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    let clock = Arc::new(TokioClock::anchored_at(start));
    let (notifier, notices) = ChannelNotifier::channel();
    let config = ConsoleConfig::default().with_runtime(RuntimeConfig {
        refresh_interval_ms,
        ..RuntimeConfig::default()
    });
    let context = ConsoleContext::new(
        config,
        Arc::new(InMemoryKeyValueStore::new()),
        Arc::new(notifier),
        Arc::clone(&clock),
    );
    let source = Arc::new(InMemorySnapshotSource::new());
    let (events, event_source) = ChannelEventSource::channel(16);
    let (runtime, handle) = ConsoleRuntime::new(context, clock, Arc::clone(&source), event_source);
    let (stop, stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(runtime.run(async move {
        drop(stopped.await);
    }));

    Rig {
        source,
        events,
        notices,
        handle,
        stop,
        task,
    }
}

type TestContext = ConsoleContext<InMemoryKeyValueStore, ChannelNotifier, TokioClock>;

async fn shutdown(
    stop: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<TestContext>,
) -> Result<TestContext> {
    stop.send(())
        .map_err(|()| eyre!("runtime stopped before shutdown"))?;
    Ok(task.await?)
}

fn key(id: &str) -> Result<TaskKey> {
    Ok(TaskKey::new(id)?)
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_action_times_out_once() -> Result<()> {
    let mut rig = start(60_000);
    let request = ActionRequest::new(ActionType::Deploy, "T-1003", "Deploy build")
        .with_id("a1")
        .with_timeout(Duration::from_millis(1000));

    rig.handle
        .track_action(request)
        .await
        .ok_or_else(|| eyre!("runtime stopped"))??;
    tokio::time::sleep(Duration::from_millis(1001)).await;

    let notice = rig
        .notices
        .recv()
        .await
        .ok_or_else(|| eyre!("notifier closed"))?;
    assert_eq!(notice.action_id.as_str(), "a1");
    assert_eq!(notice.failure_reason, Some(FailureReason::Timeout));

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(rig.notices.try_recv().is_err());

    let context = shutdown(rig.stop, rig.task).await?;
    assert!(context.tracker().pending().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn ledger_event_confirms_before_deadline() -> Result<()> {
    let mut rig = start(60_000);
    let request = ActionRequest::new(ActionType::Approval, "T-7", "Approve plan")
        .with_id("a1")
        .with_timeout(Duration::from_secs(5));
    rig.handle
        .track_action(request)
        .await
        .ok_or_else(|| eyre!("runtime stopped"))??;

    rig.events
        .send(LedgerEvent::new("e1", "approval.approved").with_task(key("T-7")?))
        .await?;
    let notice = rig
        .notices
        .recv()
        .await
        .ok_or_else(|| eyre!("notifier closed"))?;
    assert!(notice.success);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(rig.notices.try_recv().is_err());
    shutdown(rig.stop, rig.task).await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn periodic_refresh_replaces_tasks() -> Result<()> {
    let rig = start(1_000);
    rig.source
        .respond_with(Ok(json!({ "data": [{ "id": "T-1" }, { "id": "T-2" }] })));
    tokio::time::sleep(Duration::from_millis(10)).await;

    rig.source.respond_with(Ok(json!([{ "id": "T-2" }, { "id": "T-3" }])));
    tokio::time::sleep(Duration::from_millis(1_000)).await;

    let context = shutdown(rig.stop, rig.task).await?;
    let ids: Vec<&str> = context
        .tasks()
        .iter()
        .map(|task| task.id().as_str())
        .collect();
    assert_eq!(ids, ["T-2", "T-3"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_tasks_until_dismissed() -> Result<()> {
    let rig = start(1_000);
    rig.source.respond_with(Ok(json!([{ "id": "T-1" }])));
    tokio::time::sleep(Duration::from_millis(10)).await;

    rig.source
        .respond_with(Err(SnapshotError::Transport("offline".to_owned())));
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert!(rig.handle.send(ConsoleCommand::RefreshNow).await);
    tokio::time::sleep(Duration::from_millis(10)).await;

    let context = shutdown(rig.stop, rig.task).await?;
    assert_eq!(context.tasks().len(), 1);
    assert!(context.refresh_error().is_some());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn closed_event_stream_keeps_refreshing() -> Result<()> {
    let rig = start(1_000);
    drop(rig.events);
    rig.source.respond_with(Ok(json!([{ "id": "T-9" }])));
    tokio::time::sleep(Duration::from_millis(1_500)).await;

    let context = shutdown(rig.stop, rig.task).await?;
    assert_eq!(context.tasks().len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn reset_command_clears_state() -> Result<()> {
    let rig = start(60_000);
    rig.source.respond_with(Ok(json!([{ "id": "T-1" }])));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(
        rig.handle
            .send(ConsoleCommand::SetOverride {
                task_id: key("T-1")?,
                field: OverrideField::Title,
                value: json!("Renamed"),
            })
            .await
    );

    assert!(rig.handle.send(ConsoleCommand::Reset).await);
    tokio::time::sleep(Duration::from_millis(10)).await;

    let context = shutdown(rig.stop, rig.task).await?;
    assert!(context.tasks().is_empty());
    assert!(
        context
            .overrides_for(&key("T-1")?)
            .title
            .is_none()
    );
    Ok(())
}
