//! In-memory adapters for tests and ephemeral sessions.

mod kv_store;
mod notifier;
mod snapshot;

pub use kv_store::InMemoryKeyValueStore;
pub use notifier::RecordingNotifier;
pub use snapshot::InMemorySnapshotSource;
