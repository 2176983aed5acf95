//! Console configuration.
//!
//! Every section has working defaults, so an empty JSON object is a valid
//! configuration. Policy values the backend never documented (the action
//! timeout, the shared-correlation rule) are configurable here rather than
//! hard-coded in the services.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::domain::TopicClassifier;
use crate::logging::LoggingConfig;

/// Default confirmation window for pending actions.
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 30_000;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON for [`ConsoleConfig`].
    #[error("invalid console configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The override namespace is blank.
    #[error("override namespace must not be empty")]
    EmptyNamespace,

    /// A timeout or interval is zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// No identifier prefix is configured, which would hide every task.
    #[error("at least one task identifier prefix is required")]
    NoIdentifierPrefixes,
}

/// What to do when several pending actions share one correlation task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedCorrelationPolicy {
    /// A matching event resolves every pending action for the task.
    #[default]
    ResolveAll,
    /// A matching event resolves only the earliest registered action.
    OldestOnly,
}

/// Pending action tracker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Confirmation window applied when a request does not set its own.
    pub default_timeout_ms: u64,
    /// Topic classification patterns.
    pub topics: TopicClassifier,
    /// Handling of concurrent actions on the same task.
    pub shared_correlation: SharedCorrelationPolicy,
    /// Number of resolved notices kept for the activity feed.
    pub history_size: usize,
}

impl TrackerConfig {
    /// Returns the default confirmation window.
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Sets the default confirmation window.
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the shared-correlation policy.
    #[must_use]
    pub const fn with_shared_correlation(mut self, policy: SharedCorrelationPolicy) -> Self {
        self.shared_correlation = policy;
        self
    }

    /// Replaces the topic classifier.
    #[must_use]
    pub fn with_topics(mut self, topics: TopicClassifier) -> Self {
        self.topics = topics;
        self
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
            topics: TopicClassifier::default(),
            shared_correlation: SharedCorrelationPolicy::default(),
            history_size: 50,
        }
    }
}

/// Override store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideConfig {
    /// Key namespace, the `<ns>` in `<ns>.<field>.<task_id>`.
    pub namespace: String,
}

impl OverrideConfig {
    /// Sets the key namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self {
            namespace: "ledgerboard.override".to_owned(),
        }
    }
}

/// Visibility filter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityConfig {
    /// Prefixes of human-created task identifiers (`<prefix>-<digits>`).
    pub identifier_prefixes: Vec<String>,
    /// Title the backend gives to allocated-but-unused task shells.
    pub placeholder_title: String,
}

impl EligibilityConfig {
    /// Replaces the accepted identifier prefixes.
    #[must_use]
    pub fn with_identifier_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identifier_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the placeholder shell title.
    #[must_use]
    pub fn with_placeholder_title(mut self, title: impl Into<String>) -> Self {
        self.placeholder_title = title.into();
        self
    }
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            identifier_prefixes: vec!["T".to_owned(), "TASK".to_owned()],
            placeholder_title: "New task".to_owned(),
        }
    }
}

/// Event loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Interval between full snapshot refreshes.
    pub refresh_interval_ms: u64,
    /// Number of recent event ids remembered for duplicate suppression.
    pub seen_event_window: usize,
    /// Number of events kept in the activity feed.
    pub activity_feed_size: usize,
}

impl RuntimeConfig {
    /// Returns the refresh interval.
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 15_000,
            seen_event_window: 1_024,
            activity_feed_size: 200,
        }
    }
}

/// Complete console configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Tracker settings.
    pub tracker: TrackerConfig,
    /// Override store settings.
    pub overrides: OverrideConfig,
    /// Visibility filter settings.
    pub eligibility: EligibilityConfig,
    /// Event loop settings.
    pub runtime: RuntimeConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl ConsoleConfig {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the document is malformed or invalid.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.overrides.namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if self.tracker.default_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("tracker.default_timeout_ms"));
        }
        if self.runtime.refresh_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration("runtime.refresh_interval_ms"));
        }
        if self.eligibility.identifier_prefixes.is_empty() {
            return Err(ConfigError::NoIdentifierPrefixes);
        }
        Ok(())
    }

    /// Replaces the tracker settings.
    #[must_use]
    pub fn with_tracker(mut self, tracker: TrackerConfig) -> Self {
        self.tracker = tracker;
        self
    }

    /// Replaces the override settings.
    #[must_use]
    pub fn with_overrides(mut self, overrides: OverrideConfig) -> Self {
        self.overrides = overrides;
        self
    }

    /// Replaces the visibility filter settings.
    #[must_use]
    pub fn with_eligibility(mut self, eligibility: EligibilityConfig) -> Self {
        self.eligibility = eligibility;
        self
    }

    /// Replaces the event loop settings.
    #[must_use]
    pub fn with_runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }
}
