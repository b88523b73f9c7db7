//! Command-line configuration for the `ikigai-mcp` binary.
//!
//! Platform credentials fall back to `IKIGAI_*` environment variables.

use std::time::Duration;

use clap::Parser;
use ikigai_lib::{ClientOptions, Credentials};

use crate::logging::{LogFormat, LoggingConfig};
use crate::transport::ServeConfig;

/// Command-line arguments.
///
/// No `Debug` impl: it holds the API key.
#[derive(Parser, Clone)]
#[command(
    name = "ikigai-mcp",
    author,
    version,
    about = "MCP server for an Ikigai app's datasets, flows, dashboards and charts"
)]
pub struct ServerArgs {
    /// Base URL of the Ikigai API.
    #[arg(long, env = "IKIGAI_BASE_URL")]
    pub base_url: String,

    /// Email of the platform user.
    #[arg(long, env = "IKIGAI_USER_EMAIL")]
    pub user_email: String,

    /// Platform API key.
    #[arg(long, env = "IKIGAI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Exact name of the app to serve.
    #[arg(long, env = "IKIGAI_APP_NAME")]
    pub app_name: String,

    /// Interface to bind.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind.
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Endpoint path of the MCP server.
    #[arg(long, default_value = "/mcp")]
    pub path: String,

    /// Longest wait for a flow run, in seconds.
    #[arg(long, default_value_t = 3600)]
    pub run_timeout_secs: u64,

    /// Delay between flow status polls, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Timeout of a single platform request, in seconds.
    #[arg(long, default_value_t = 60)]
    pub request_timeout_secs: u64,

    /// Log filter directive.
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format: `text` or `json`.
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl ServerArgs {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.base_url, &self.user_email, &self.api_key)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            run_timeout: Duration::from_secs(self.run_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn serve_config(&self) -> ServeConfig {
        let path = format!("/{}", self.path.trim_matches('/'));
        ServeConfig {
            host: self.host.clone(),
            port: self.port,
            path,
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            format: LogFormat::parse(&self.log_format),
            level: self.log_level.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 9] = [
        "ikigai-mcp",
        "--base-url",
        "https://api.ikigailabs.io",
        "--user-email",
        "me@example.com",
        "--api-key",
        "s3cret",
        "--app-name",
        "Forecasting",
    ];

    #[test]
    fn test_defaults() {
        let args = ServerArgs::try_parse_from(REQUIRED).unwrap();
        assert_eq!(args.serve_config(), ServeConfig::default());
        assert_eq!(args.client_options(), ClientOptions::default());
    }

    #[test]
    fn test_path_gets_leading_slash() {
        let mut argv = REQUIRED.to_vec();
        argv.extend(["--path", "agents/mcp", "--port", "9100"]);
        let config = ServerArgs::try_parse_from(argv).unwrap().serve_config();
        assert_eq!(config.path, "/agents/mcp");
        assert_eq!(config.port, 9100);
    }

    #[test]
    fn test_path_trailing_slash_is_dropped() {
        let mut argv = REQUIRED.to_vec();
        argv.extend(["--path", "/mcp/"]);
        let config = ServerArgs::try_parse_from(argv).unwrap().serve_config();
        assert_eq!(config.path, "/mcp");

        let mut argv = REQUIRED.to_vec();
        argv.extend(["--path", "/"]);
        let config = ServerArgs::try_parse_from(argv).unwrap().serve_config();
        assert_eq!(config.path, "/");
    }

    #[test]
    fn test_timeouts_and_logging() {
        let mut argv = REQUIRED.to_vec();
        argv.extend([
            "--run-timeout-secs",
            "5",
            "--poll-interval-ms",
            "250",
            "--log-format",
            "json",
            "--log-level",
            "debug",
        ]);
        let args = ServerArgs::try_parse_from(argv).unwrap();
        let opts = args.client_options();
        assert_eq!(opts.run_timeout, Duration::from_secs(5));
        assert_eq!(opts.poll_interval, Duration::from_millis(250));
        let logging = args.logging_config();
        assert_eq!(logging.format, LogFormat::Json);
        assert_eq!(logging.level, "debug");
    }

    #[test]
    fn test_credentials_never_render_key() {
        let args = ServerArgs::try_parse_from(REQUIRED).unwrap();
        assert!(!format!("{:?}", args.credentials()).contains("s3cret"));
    }
}
