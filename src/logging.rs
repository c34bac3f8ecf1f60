//! Logging configuration using tracing.

use crate::error::{BackupError, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging. `RUST_LOG` takes precedence over `level`.
pub fn init(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .map_err(|e| BackupError::InvalidConfig(format!("logging already initialized: {}", e)))
}

/// Default filter for the given verbosity.
pub fn level_for(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}
