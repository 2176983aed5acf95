//! Application services for the reconciliation core.

mod console;
mod eligibility;
mod normalize;
mod overrides;
mod reconciler;
mod runtime;
mod tracker;

pub use console::{ConsoleContext, EventReport};
pub use eligibility::{BoardView, Eligibility, EligibilityFilter, Placement, Suppression};
pub use normalize::normalize_snapshot;
pub use overrides::OverrideStore;
pub use reconciler::{ReconcileOutcome, reconcile};
pub use runtime::{ConsoleCommand, ConsoleHandle, ConsoleRuntime};
pub use tracker::{PendingActionTracker, TrackerError, TrackerResult};
