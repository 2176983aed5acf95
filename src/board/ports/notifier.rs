//! Port for publishing pending-action resolutions.

use crate::board::domain::ResolutionNotice;

/// Receives one notice per terminal transition of a pending action.
///
/// Implementations feed toast and activity-feed collaborators and must not
/// block the caller.
pub trait ResolutionNotifier: Send + Sync {
    /// Publishes a resolution notice.
    fn notify(&self, notice: &ResolutionNotice);
}
