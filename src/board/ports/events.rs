//! Port for the long-lived ledger event stream.

use crate::board::domain::LedgerEvent;
use async_trait::async_trait;

/// Push connection delivering ledger events in delivery order.
#[async_trait]
pub trait LedgerEventSource: Send {
    /// Waits for the next delivered event.
    ///
    /// Returns `None` once the stream has closed.
    async fn next_event(&mut self) -> Option<LedgerEvent>;
}
