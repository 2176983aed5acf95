//! Adapter implementations for the board ports.

pub mod channel;
pub mod clock;
pub mod file;
pub mod memory;

pub use channel::{ChannelEventSource, ChannelNotifier};
pub use clock::{ManualClock, TokioClock};
pub use file::FileKeyValueStore;
pub use memory::{InMemoryKeyValueStore, InMemorySnapshotSource, RecordingNotifier};
