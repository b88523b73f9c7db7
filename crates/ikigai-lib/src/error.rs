use std::time::Duration;

use thiserror::Error;

/// Convenient result alias for the Ikigai client library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured application name does not exist for this user.
    #[error("app '{name}' not found for the configured user")]
    AppNotFound { name: String },

    /// Raised when no dataset in the app carries the requested name.
    #[error("dataset '{name}' not found")]
    DatasetNotFound { name: String },

    /// Raised when no flow in the app carries the requested name.
    #[error("flow '{name}' not found")]
    FlowNotFound { name: String },

    /// Raised when a triggered flow does not reach a terminal status in time.
    #[error("flow '{flow}' did not finish within {}s", .timeout.as_secs())]
    RunTimeout { flow: String, timeout: Duration },

    /// The platform answered with a non-success HTTP status.
    #[error("platform request {path} failed with status {status}: {message}")]
    Api {
        status: u16,
        path: String,
        message: String,
    },

    /// The platform answered with a body that does not match the expected shape.
    #[error("unexpected response from {path}: {message}")]
    InvalidResponse { path: String, message: String },

    /// Credentials contain characters that cannot be sent as HTTP headers.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The base URL could not be used to build request URLs.
    #[error("invalid base url '{url}'")]
    InvalidBaseUrl { url: String },

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Wrapper for CSV decoding errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Short machine-readable name of the error kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::AppNotFound { .. } => "app_not_found",
            Error::DatasetNotFound { .. } | Error::FlowNotFound { .. } => "not_found",
            Error::RunTimeout { .. } => "timeout",
            Error::InvalidCredentials(_) | Error::InvalidBaseUrl { .. } => "config",
            Error::Api { .. }
            | Error::InvalidResponse { .. }
            | Error::Http(_)
            | Error::Csv(_) => "remote",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_messages_include_name() {
        let err = Error::DatasetNotFound {
            name: "sales".into(),
        };
        assert!(err.to_string().contains("sales"));
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn timeout_message_reports_seconds() {
        let err = Error::RunTimeout {
            flow: "nightly".into(),
            timeout: Duration::from_secs(90),
        };
        assert_eq!(err.to_string(), "flow 'nightly' did not finish within 90s");
        assert_eq!(err.kind(), "timeout");
    }
}
