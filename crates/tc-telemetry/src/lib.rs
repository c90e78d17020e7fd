//! # TC Telemetry
//!
//! Logging and metrics for the server update-status subsystem.
//!
//! ## Components
//!
//! - **Logs**: `tracing` records rendered by `tracing-subscriber`, pretty or JSON
//! - **Metrics**: Prometheus counters and histograms in a process registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tc_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TC_SERVICE_NAME` | `tc-server-updates` | Service name in log records |
//! | `TC_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` also honoured) |
//! | `TC_CONSOLE_OUTPUT` | `true` | Emit records to stdout |
//! | `TC_JSON_LOGS` | `false` | JSON records instead of pretty text |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};
pub use metrics::{
    gather_metrics, register_metrics, HistogramTimer, APPLY_REPORTS, COMMIT_DURATION,
    COMMIT_RETRIES, PROPAGATION_FANOUT, QUEUE_ACTIONS, STATUS_CHANGES, UPDATE_ERRORS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A collector could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// The configuration could not be turned into a filter.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the global log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    // Metrics first; registration never touches global logging state
    register_metrics()?;
    init_logging(config)
}
