//! Notifier that records every resolution notice in memory.

use std::sync::{Arc, RwLock};

use crate::board::{domain::ResolutionNotice, ports::ResolutionNotifier};

/// Records resolution notices for later inspection.
///
/// Clones share the same buffer, so a test can keep one handle while the
/// tracker owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<RwLock<Vec<ResolutionNotice>>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded notices in emission order.
    #[must_use]
    pub fn notices(&self) -> Vec<ResolutionNotice> {
        self.notices
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Returns the number of recorded notices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notices.read().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResolutionNotifier for RecordingNotifier {
    fn notify(&self, notice: &ResolutionNotice) {
        if let Ok(mut guard) = self.notices.write() {
            guard.push(notice.clone());
        }
    }
}
