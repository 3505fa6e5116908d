//! # ABR Telemetry
//!
//! Logging bootstrap for the compose client crates and the `abr-cli` tool.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use abr_telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::from_env())?;
//! tracing::info!(path = "/impressions", "state refreshed");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ABR_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `ABR_JSON_LOGS` | `false` | JSON formatted output |
//! | `ABR_CONSOLE_OUTPUT` | `true` | Write logs to stderr/stdout |
//! | `ABR_SERVICE_NAME` | `abr-compose` | Service name field |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter {0}")]
    Filter(String),

    #[error("Global subscriber already set: {0}")]
    AlreadyInitialized(String),
}

/// Initialize logging for a process.
///
/// A second call in the same process returns
/// [`TelemetryError::AlreadyInitialized`]; callers that may race a test
/// harness can ignore that variant.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)
}
