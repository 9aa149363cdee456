//! Structured logging configuration shared by HiveCom binaries.
//!
//! The mesh crate logs through `tracing` directly; this crate only owns the
//! config shape and the subscriber wiring, so a binary can turn a config
//! file into an initialized global subscriber in one call.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive string, e.g. `"hivecom_mesh=debug,warn"`.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit ANSI color codes. Disable for log aggregators that don't strip them.
    #[serde(default = "default_true")]
    pub ansi: bool,
    /// Include the originating target (module path) in each line.
    #[serde(default = "default_true")]
    pub with_target: bool,
}

fn default_filter() -> String {
    "info".to_owned()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            ansi: true,
            with_target: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("logging subscriber already initialized")]
    AlreadyInitialized,
}

/// Install `config` as the global `tracing` subscriber. Safe to call at most
/// once per process; a second call returns `Err` rather than panicking.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(config.with_target)
        .try_init()
        .map_err(|_| TelemetryError::AlreadyInitialized)
}
