//! Shared fixtures and builders for board tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rstest::fixture;

use crate::board::{
    adapters::{InMemoryKeyValueStore, ManualClock, RecordingNotifier},
    config::{ConsoleConfig, OverrideConfig, TrackerConfig},
    domain::{LedgerEvent, TaskKey, TaskRecord},
    services::{ConsoleContext, OverrideStore, PendingActionTracker},
};

/// Context type used across the service tests.
pub type TestContext = ConsoleContext<InMemoryKeyValueStore, RecordingNotifier, ManualClock>;

/// Instant every test clock starts at.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .expect("fixed test instant is unambiguous")
}

pub fn key(id: &str) -> TaskKey {
    TaskKey::new(id).expect("test task key should be valid")
}

pub fn task(id: &str) -> TaskRecord {
    TaskRecord::new(key(id), format!("Task {id}"))
}

pub fn event_for(event_id: &str, topic: &str, task_id: &str) -> LedgerEvent {
    LedgerEvent::new(event_id, topic).with_task(key(task_id))
}

#[fixture]
pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(epoch()))
}

#[fixture]
pub fn notifier() -> Arc<RecordingNotifier> {
    Arc::new(RecordingNotifier::new())
}

#[fixture]
pub fn store() -> Arc<InMemoryKeyValueStore> {
    Arc::new(InMemoryKeyValueStore::new())
}

/// Harness exposing the collaborators a service was built with.
pub struct Harness<T> {
    pub subject: T,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub store: Arc<InMemoryKeyValueStore>,
}

#[fixture]
pub fn tracker(
    clock: Arc<ManualClock>,
    notifier: Arc<RecordingNotifier>,
    store: Arc<InMemoryKeyValueStore>,
) -> Harness<PendingActionTracker<RecordingNotifier, ManualClock>> {
    Harness {
        subject: PendingActionTracker::new(
            TrackerConfig::default(),
            Arc::clone(&notifier),
            Arc::clone(&clock),
        ),
        clock,
        notifier,
        store,
    }
}

#[fixture]
pub fn overrides(
    clock: Arc<ManualClock>,
    notifier: Arc<RecordingNotifier>,
    store: Arc<InMemoryKeyValueStore>,
) -> Harness<OverrideStore<InMemoryKeyValueStore, ManualClock>> {
    Harness {
        subject: OverrideStore::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            &OverrideConfig::default(),
        ),
        clock,
        notifier,
        store,
    }
}

#[fixture]
pub fn console(
    clock: Arc<ManualClock>,
    notifier: Arc<RecordingNotifier>,
    store: Arc<InMemoryKeyValueStore>,
) -> Harness<TestContext> {
    Harness {
        subject: ConsoleContext::new(
            ConsoleConfig::default(),
            Arc::clone(&store),
            Arc::clone(&notifier),
            Arc::clone(&clock),
        ),
        clock,
        notifier,
        store,
    }
}
