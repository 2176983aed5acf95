//! Tokio channel adapters bridging the core to the rest of the console.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::board::{
    domain::{LedgerEvent, ResolutionNotice},
    ports::{LedgerEventSource, ResolutionNotifier},
};

/// Event source fed by the push-connection task through an mpsc channel.
#[derive(Debug)]
pub struct ChannelEventSource {
    receiver: mpsc::Receiver<LedgerEvent>,
}

impl ChannelEventSource {
    /// Wraps an existing receiver.
    #[must_use]
    pub const fn new(receiver: mpsc::Receiver<LedgerEvent>) -> Self {
        Self { receiver }
    }

    /// Creates a bounded channel and returns its sender with the source.
    #[must_use]
    pub fn channel(capacity: usize) -> (mpsc::Sender<LedgerEvent>, Self) {
        let (sender, receiver) = mpsc::channel(capacity);
        (sender, Self::new(receiver))
    }
}

#[async_trait]
impl LedgerEventSource for ChannelEventSource {
    async fn next_event(&mut self) -> Option<LedgerEvent> {
        self.receiver.recv().await
    }
}

/// Notifier forwarding notices to toast and activity-feed consumers.
///
/// Sending never blocks; notices for a dropped consumer are discarded.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<ResolutionNotice>,
}

impl ChannelNotifier {
    /// Creates a notifier and the receiver its notices arrive on.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ResolutionNotice>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ResolutionNotifier for ChannelNotifier {
    fn notify(&self, notice: &ResolutionNotice) {
        if self.sender.send(notice.clone()).is_err() {
            tracing::debug!(
                action_id = %notice.action_id,
                "resolution consumer dropped, notice discarded"
            );
        }
    }
}
