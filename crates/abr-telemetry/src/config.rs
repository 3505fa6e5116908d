//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for client-side logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full directive
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to colour console output
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "abr-compose".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ABR_SERVICE_NAME`: Service name (default: abr-compose)
    /// - `ABR_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `ABR_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `ABR_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `NO_COLOR`: Disable ANSI colours when set
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("ABR_SERVICE_NAME")
                .unwrap_or_else(|_| "abr-compose".to_string()),

            log_level: env::var("ABR_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("ABR_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),

            json_logs: env::var("ABR_JSON_LOGS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(false),

            ansi: env::var("NO_COLOR").is_err(),
        }
    }

    /// Create configuration for a named tool, keeping env overrides.
    pub fn for_tool(tool_name: &str) -> Self {
        let mut config = Self::from_env();
        if env::var("ABR_SERVICE_NAME").is_err() {
            config.service_name = tool_name.to_string();
        }
        config
    }

    /// Raise the level to `debug` unless a full directive was configured.
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose && !self.log_level.contains('=') {
            self.log_level = "debug".to_string();
        }
        self
    }
}

fn parse_flag(value: &str, default: bool) -> bool {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
