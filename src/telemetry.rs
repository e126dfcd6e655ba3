//! Log subscriber setup for the command line tool.

use std::env;
use std::io::{self, IsTerminal};
use std::sync::OnceLock;

use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "NXSTYLE_LOG";

const DEFAULT_FILTER: &str = "warn";

static TELEMETRY_GUARD: OnceLock<()> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter in {LOG_ENV}: {0}")]
    Filter(String),
    #[error("failed to install log subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Install the global subscriber, logging to stderr.
///
/// Only the first call installs anything; later calls return `Ok(())`.
pub fn initialise() -> Result<(), TelemetryError> {
    if TELEMETRY_GUARD.get().is_some() {
        return Ok(());
    }
    let directives = env::var(LOG_ENV).unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    install_subscriber(&directives)?;
    let _ = TELEMETRY_GUARD.set(());
    Ok(())
}

fn install_subscriber(directives: &str) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_new(directives).map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
