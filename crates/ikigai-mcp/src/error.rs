//! Error types and RFC 9457-style problem details for the MCP server
//!
//! Every failure a caller can see is one of these. Tool failures are
//! rendered as error results, resource failures as JSON-RPC errors carrying
//! the serialized problem as `data`.

use ikigai_lib::Error as LibError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

/// Result type for MCP operations
pub type Result<T> = std::result::Result<T, Error>;

pub const PROBLEM_NOT_FOUND: &str = "https://ikigai-mcp.local/errors/not-found";
pub const PROBLEM_INVALID_PARAMETER: &str = "https://ikigai-mcp.local/errors/invalid-parameter";
pub const PROBLEM_REMOTE: &str = "https://ikigai-mcp.local/errors/remote";
pub const PROBLEM_TIMEOUT: &str = "https://ikigai-mcp.local/errors/timeout";
pub const PROBLEM_INTERNAL: &str = "https://ikigai-mcp.local/errors/internal-error";

/// MCP Server error type implementing RFC 9457 Problem Details
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq)]
#[error("{message}")]
pub struct Error {
    /// HTTP status-like code (e.g., 400, 404, 502)
    pub code: i32,

    /// Human-readable error message
    pub message: String,

    /// Machine-readable problem type URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,

    /// Additional error context (e.g., dataset name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl Error {
    /// Create a new error with a code and message
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            r#type: None,
            context: None,
        }
    }

    /// Add a problem type URI
    pub fn with_type(mut self, type_uri: impl Into<String>) -> Self {
        self.r#type = Some(type_uri.into());
        self
    }

    /// Add context information as JSON
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// A named dataset or flow does not exist
    pub fn not_found(kind: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(404, format!("{} '{}' not found", capitalize(kind), name))
            .with_type(PROBLEM_NOT_FOUND)
            .with_context(json!({
                "kind": kind,
                "name": name,
            }))
    }

    /// Invalid parameter error
    pub fn invalid_param(param: impl Into<String>, reason: impl Into<String>) -> Self {
        let p = param.into();
        let reason = reason.into();
        Self::new(400, format!("Invalid parameter '{}': {}", p, reason))
            .with_type(PROBLEM_INVALID_PARAMETER)
            .with_context(json!({
                "parameter": p,
                "reason": reason
            }))
    }

    /// The platform call failed
    pub fn remote(reason: impl Into<String>) -> Self {
        Self::new(502, format!("Remote platform error: {}", reason.into())).with_type(PROBLEM_REMOTE)
    }

    /// A flow run exceeded the configured wait
    pub fn timeout(flow: impl Into<String>, timeout_secs: u64) -> Self {
        let flow = flow.into();
        Self::new(
            504,
            format!(
                "Flow '{}' did not finish within {} seconds",
                flow, timeout_secs
            ),
        )
        .with_type(PROBLEM_TIMEOUT)
        .with_context(json!({
            "flow_name": flow,
            "timeout_secs": timeout_secs
        }))
    }

    /// Internal server error
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::new(500, format!("Internal server error: {}", reason.into()))
            .with_type(PROBLEM_INTERNAL)
    }

    /// Short name of the error kind, for log fields.
    pub fn kind(&self) -> &'static str {
        match self.code {
            400 => "validation",
            404 => "not_found",
            502 => "remote",
            504 => "timeout",
            _ => "internal",
        }
    }
}

impl From<LibError> for Error {
    fn from(err: LibError) -> Self {
        debug!(kind = err.kind(), error = %err, "platform call failed");
        match err {
            LibError::DatasetNotFound { name } => Error::not_found("dataset", name),
            LibError::FlowNotFound { name } => Error::not_found("flow", name),
            LibError::RunTimeout { flow, timeout } => Error::timeout(flow, timeout.as_secs()),
            other => Error::remote(other.to_string()),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_creation() {
        let err = Error::new(400, "Bad request");
        assert_eq!(err.code, 400);
        assert_eq!(err.message, "Bad request");
    }

    #[test]
    fn test_not_found_mentions_name() {
        let err = Error::not_found("dataset", "Quarterly Sales");
        assert_eq!(err.code, 404);
        assert_eq!(err.message, "Dataset 'Quarterly Sales' not found");
        assert_eq!(err.kind(), "not_found");
        assert_eq!(err.context.unwrap()["name"], "Quarterly Sales");
    }

    #[test]
    fn test_lib_errors_map_to_taxonomy() {
        let err: Error = LibError::FlowNotFound {
            name: "nightly".into(),
        }
        .into();
        assert_eq!(err.kind(), "not_found");
        assert!(err.message.contains("nightly"));

        let err: Error = LibError::RunTimeout {
            flow: "nightly".into(),
            timeout: Duration::from_secs(30),
        }
        .into();
        assert_eq!(err.code, 504);
        assert_eq!(err.kind(), "timeout");

        let err: Error = LibError::Api {
            status: 503,
            path: "/component/get-flows-for-app".into(),
            message: "maintenance".into(),
        }
        .into();
        assert_eq!(err.kind(), "remote");
        assert!(err.message.contains("maintenance"));
    }

    #[test]
    fn test_error_serialization() {
        let err = Error::invalid_param("dataset_name", "must not be empty");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], 400);
        assert_eq!(json["type"], PROBLEM_INVALID_PARAMETER);
        assert_eq!(json["context"]["parameter"], "dataset_name");
    }
}
