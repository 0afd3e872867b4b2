//! Observability for table operations
//!
//! Logging goes through `tracing`. All events use the `elastic_fdw` target and
//! carry an `event` field naming an `Event`.
//!
//! The library never installs a global subscriber on its own; binaries call
//! `init_tracing`.
//!
//! # Conventions
//!
//! - `event`: an `Event` name (required)
//! - `path`: the table's target path
//! - `%` for Display, `?` for Debug formatting

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{MetricsSnapshot, TableMetrics};

use tracing_subscriber::EnvFilter;

/// Target for all table log events
pub(crate) const LOG_TARGET: &str = "elastic_fdw";

macro_rules! log_debug {
    ($($field:tt)*) => {
        ::tracing::debug!(target: $crate::observability::LOG_TARGET, $($field)*)
    };
}

macro_rules! log_info {
    ($($field:tt)*) => {
        ::tracing::info!(target: $crate::observability::LOG_TARGET, $($field)*)
    };
}

macro_rules! log_warn {
    ($($field:tt)*) => {
        ::tracing::warn!(target: $crate::observability::LOG_TARGET, $($field)*)
    };
}

macro_rules! log_error {
    ($($field:tt)*) => {
        ::tracing::error!(target: $crate::observability::LOG_TARGET, $($field)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_error;
pub(crate) use log_info;
pub(crate) use log_warn;

/// Install a stderr subscriber filtered by `RUST_LOG` (default `warn`)
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
