//! Structured logging set-up.
//!
//! The library only emits `tracing` events; hosts call [`init_logging`] once
//! at start-up to install a subscriber. `RUST_LOG` takes precedence over the
//! configured level.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, for example `info` or `ledgerboard=debug`.
    pub level: String,
    /// Emit one JSON object per line instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

/// Installs the global subscriber.
///
/// Returns `false` when another subscriber was already installed, which is
/// not treated as an error.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        tracing::info!(level = %config.level, json = config.json, "logging initialised");
    } else {
        tracing::debug!("global tracing subscriber already installed, keeping it");
    }
    installed
}
