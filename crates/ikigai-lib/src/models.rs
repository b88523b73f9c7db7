//! Read-only views of the platform entities this crate hands out.
//!
//! Every value here is a snapshot taken during a single call. Nothing is
//! cached between calls, so two reads may disagree when the remote state
//! changed in between.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// The application every operation is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppHandle {
    pub app_id: String,
    pub name: String,
}

/// One column of a dataset together with the platform's type label for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    pub column: String,
    pub data_type: String,
}

impl ColumnType {
    pub fn new(column: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            data_type: data_type.into(),
        }
    }

    /// Whether cells of this column should be emitted as JSON numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.data_type.to_ascii_uppercase().as_str(),
            "NUMERIC" | "INTEGER" | "FLOAT" | "NUMBER"
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Dataset {
    pub dataset_id: String,
    pub name: String,
    /// Number of records reported by the platform.
    #[serde(default)]
    pub size: u64,
    /// Column types in platform order.
    #[serde(default, deserialize_with = "column_types")]
    pub data_types: Vec<ColumnType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Flow {
    pub flow_id: String,
    pub name: String,
}

/// Execution state of a flow as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum FlowStatus {
    Idle,
    Scheduled,
    Running,
    Success,
    Failed,
    Stopped,
    /// Any label this crate does not know about, kept verbatim.
    Other(String),
}

impl FlowStatus {
    /// A flow in a terminal state will not change without a new run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FlowStatus::Scheduled | FlowStatus::Running)
    }
}

impl From<String> for FlowStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "IDLE" => FlowStatus::Idle,
            "SCHEDULED" | "QUEUED" => FlowStatus::Scheduled,
            "RUNNING" => FlowStatus::Running,
            "SUCCESS" => FlowStatus::Success,
            "FAILED" => FlowStatus::Failed,
            "STOPPED" => FlowStatus::Stopped,
            _ => FlowStatus::Other(value),
        }
    }
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowStatus::Idle => write!(f, "IDLE"),
            FlowStatus::Scheduled => write!(f, "SCHEDULED"),
            FlowStatus::Running => write!(f, "RUNNING"),
            FlowStatus::Success => write!(f, "SUCCESS"),
            FlowStatus::Failed => write!(f, "FAILED"),
            FlowStatus::Stopped => write!(f, "STOPPED"),
            FlowStatus::Other(label) => write!(f, "{}", label),
        }
    }
}

/// Log entry produced by the platform for one flow run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunLog {
    pub log_id: String,
    pub status: FlowStatus,
    #[serde(default)]
    pub user: String,
    /// Facet that failed the run, absent for clean runs.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub erroneous_facet_id: Option<String>,
    /// Free-form auxiliary payload; structured values are kept as JSON text.
    #[serde(default, deserialize_with = "stringified")]
    pub data: String,
    #[serde(deserialize_with = "flexible_timestamp")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Dashboard {
    pub dashboard_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Chart {
    pub chart_id: String,
    pub name: String,
    #[serde(default)]
    pub chart_type: String,
}

/// Result of enumerating a collection that older platform builds lack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability<T> {
    Available(Vec<T>),
    /// The platform does not offer this collection; carries the reason.
    Unavailable(String),
}

fn column_types<'de, D>(deserializer: D) -> Result<Vec<ColumnType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Map<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(column, value)| {
            let data_type = match value {
                Value::String(label) => label,
                Value::Object(ref fields) => match fields.get("data_type") {
                    Some(Value::String(label)) => label.clone(),
                    _ => value.to_string(),
                },
                other => other.to_string(),
            };
            ColumnType { column, data_type }
        })
        .collect())
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|id| !id.trim().is_empty()))
}

fn stringified<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    })
}

fn flexible_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    let raw = Value::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| D::Error::custom(format!("unrecognised timestamp: {}", raw)))
}

/// Accepts epoch seconds (number or numeric string) or RFC 3339 text.
pub(crate) fn parse_timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|secs| secs.trunc() as i64))
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        Value::String(text) => {
            let text = text.trim();
            if let Ok(secs) = text.parse::<i64>() {
                return DateTime::from_timestamp(secs, 0);
            }
            if let Ok(secs) = text.parse::<f64>() {
                return DateTime::from_timestamp(secs.trunc() as i64, 0);
            }
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|ts| ts.with_timezone(&Utc))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dataset_column_types_keep_platform_order() {
        let dataset: Dataset = serde_json::from_value(json!({
            "dataset_id": "ds-1",
            "name": "sales",
            "size": 42,
            "data_types": {
                "zeta": {"data_type": "NUMERIC"},
                "alpha": "TEXT",
                "mid": {"data_type": "TIME", "data_formats": {}}
            }
        }))
        .unwrap();

        let columns: Vec<_> = dataset.data_types.iter().map(|c| c.column.as_str()).collect();
        assert_eq!(columns, ["zeta", "alpha", "mid"]);
        assert!(dataset.data_types[0].is_numeric());
        assert_eq!(dataset.data_types[2].data_type, "TIME");
    }

    #[test]
    fn dataset_without_types_defaults_empty() {
        let dataset: Dataset =
            serde_json::from_value(json!({"dataset_id": "ds-2", "name": "raw"})).unwrap();
        assert_eq!(dataset.size, 0);
        assert!(dataset.data_types.is_empty());
    }

    #[test]
    fn flow_status_parsing() {
        assert_eq!(FlowStatus::from("running".to_string()), FlowStatus::Running);
        assert_eq!(FlowStatus::from("QUEUED".to_string()), FlowStatus::Scheduled);
        assert_eq!(
            FlowStatus::from("PAUSED".to_string()),
            FlowStatus::Other("PAUSED".into())
        );
        assert!(FlowStatus::Failed.is_terminal());
        assert!(!FlowStatus::Running.is_terminal());
        assert_eq!(FlowStatus::Success.to_string(), "SUCCESS");
    }

    #[test]
    fn run_log_from_epoch_string() {
        let log: RunLog = serde_json::from_value(json!({
            "log_id": "log-7",
            "status": "SUCCESS",
            "user": "me@example.com",
            "erroneous_facet_id": "",
            "data": "",
            "timestamp": "1700000000"
        }))
        .unwrap();

        assert_eq!(log.status, FlowStatus::Success);
        assert_eq!(log.erroneous_facet_id, None);
        assert_eq!(log.timestamp.to_rfc3339(), "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn run_log_keeps_structured_data_and_facet() {
        let log: RunLog = serde_json::from_value(json!({
            "log_id": "log-8",
            "status": "FAILED",
            "erroneous_facet_id": "facet-3",
            "data": {"rows": 0},
            "timestamp": "2024-05-01T12:00:00+02:00"
        }))
        .unwrap();

        assert_eq!(log.erroneous_facet_id.as_deref(), Some("facet-3"));
        assert_eq!(log.data, r#"{"rows":0}"#);
        assert_eq!(log.user, "");
        assert_eq!(log.timestamp.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn invalid_timestamp_is_rejected() {
        let result: Result<RunLog, _> = serde_json::from_value(json!({
            "log_id": "log-9",
            "status": "SUCCESS",
            "timestamp": "yesterday"
        }));
        assert!(result.is_err());
    }
}
