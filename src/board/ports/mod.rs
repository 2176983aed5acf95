//! Port contracts for the reconciliation core.
//!
//! Ports define infrastructure-agnostic interfaces used by board services.

pub mod events;
pub mod kv_store;
pub mod notifier;
pub mod snapshot;

pub use events::LedgerEventSource;
pub use kv_store::{KeyValueStore, KeyValueStoreError, KeyValueStoreResult};
pub use notifier::ResolutionNotifier;
pub use snapshot::{SnapshotError, SnapshotParseError, SnapshotResult, SnapshotSource};
