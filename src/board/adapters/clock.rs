//! Clock adapters.
//!
//! The core reads wall time through [`mockable::Clock`]. [`TokioClock`] keeps
//! that reading in step with `tokio::time`, so deadlines computed from the
//! clock agree with the runtime's sleeps (including under a paused test
//! runtime). [`ManualClock`] is advanced explicitly for deterministic tests
//! and replays.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use tokio::time::Instant;

/// Wall clock anchored to a `tokio::time` instant.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin_utc: DateTime<Utc>,
    origin_instant: Instant,
}

impl TokioClock {
    /// Anchors the clock at the current wall time.
    #[must_use]
    pub fn new() -> Self {
        Self::anchored_at(Utc::now())
    }

    /// Anchors the clock at a chosen wall time.
    #[must_use]
    pub fn anchored_at(origin_utc: DateTime<Utc>) -> Self {
        Self {
            origin_utc,
            origin_instant: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.origin_instant.elapsed()).unwrap_or(TimeDelta::MAX);
        self.origin_utc
            .checked_add_signed(elapsed)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    /// Moves the clock forward by `step`.
    pub fn advance(&self, step: Duration) {
        let delta = TimeDelta::from_std(step).unwrap_or(TimeDelta::MAX);
        if let Ok(mut guard) = self.now.write() {
            *guard = guard
                .checked_add_signed(delta)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
        }
    }

    /// Sets the clock to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.write() {
            *guard = instant;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.now
            .read()
            .map(|guard| *guard)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}
