//! Structured logging setup for the MCP server.
//!
//! - [`LoggingConfig`]: format and level, normally built from CLI flags
//! - [`init_logging`]: install a JSON or text `tracing` subscriber
//!
//! Output always goes to stderr. The level string accepts any `EnvFilter`
//! directive, e.g. `info` or `ikigai_lib=debug,info`.

use serde::{Deserialize, Serialize};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON structured logging.
    Json,
    /// Human-readable text logging (default).
    #[default]
    Text,
}

impl LogFormat {
    /// Parse log format from string.
    ///
    /// "json" in any case selects JSON; every other value selects text.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Output format (json or text).
    pub format: LogFormat,
    /// Log level filter (e.g., "info", "debug", "warn").
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize the tracing subscriber with the given configuration.
///
/// Call once at startup. Fails if a global subscriber is already set.
///
/// # JSON Format
///
/// ```json
/// {"timestamp":"2026-01-10T10:00:00Z","level":"INFO","fields":{"message":"tool call","tool":"list_flows"},"target":"ikigai_mcp::server"}
/// ```
///
/// # Text Format
///
/// ```text
/// 2026-01-10T10:00:00Z  INFO ikigai_mcp::server: tool call tool=list_flows
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(config.filter());

    match config.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => {
            let json_layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(std::io::stderr);
            registry.with(json_layer).try_init()
        }
    }
}
