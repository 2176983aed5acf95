//! Shared world state for ledger authority BDD scenarios.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use ledgerboard::board::{
    adapters::{InMemoryKeyValueStore, ManualClock, RecordingNotifier},
    config::ConsoleConfig,
    domain::TaskKey,
    services::ConsoleContext,
};
use rstest::fixture;
use serde_json::Value;

/// Context type used by the BDD world.
pub type TestConsole = ConsoleContext<InMemoryKeyValueStore, RecordingNotifier, ManualClock>;

/// Scenario world for ledger authority behaviour tests.
pub struct LedgerWorld {
    pub console: TestConsole,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub pending_snapshot: Option<Value>,
    pub next_event: u64,
}

impl LedgerWorld {
    /// Creates a world around an empty console.
    #[must_use]
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let clock = Arc::new(ManualClock::new(start));
        let notifier = Arc::new(RecordingNotifier::new());
        let console = ConsoleContext::new(
            ConsoleConfig::default(),
            Arc::new(InMemoryKeyValueStore::new()),
            Arc::clone(&notifier),
            Arc::clone(&clock),
        );

        Self {
            console,
            clock,
            notifier,
            pending_snapshot: None,
            next_event: 0,
        }
    }

    /// Returns a fresh event id.
    pub fn event_id(&mut self) -> String {
        self.next_event += 1;
        format!("evt-{}", self.next_event)
    }
}

impl Default for LedgerWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> LedgerWorld {
    LedgerWorld::default()
}

/// Parses a task key from scenario text.
pub fn task_key(raw: &str) -> Result<TaskKey, eyre::Report> {
    TaskKey::new(raw).map_err(|err| eyre::eyre!("invalid task id in scenario: {err}"))
}

/// Splits a comma-separated id list from scenario text.
pub fn id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect()
}
