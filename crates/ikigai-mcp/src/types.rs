//! Type definitions for MCP tool inputs and outputs
//!
//! Inputs derive `JsonSchema` so the advertised `inputSchema` always matches
//! what the server actually accepts. Outputs are the JSON payloads returned
//! as tool text or resource contents.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// TOOL INPUTS
// ============================================================================

/// Input for the download_dataset tool
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DownloadDatasetInput {
    /// Exact, case-sensitive name of the dataset to preview
    pub dataset_name: String,
}

/// Input for the run_flow tool
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RunFlowInput {
    /// Exact, case-sensitive name of the flow to execute
    pub flow_name: String,
}

// ============================================================================
// TOOL OUTPUTS
// ============================================================================

/// Output from the download_dataset tool
///
/// `data` holds positional rows aligned with `columns`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DownloadDatasetOutput {
    pub dataset_name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<String>,
    pub data: Vec<Vec<Value>>,
}

/// Output from the run_flow tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunFlowOutput {
    pub flow_name: String,
    pub status: String,
    pub log_id: String,
    pub user: String,
    /// Serialized as an explicit `null` for clean runs
    pub erroneous_facet_id: Option<String>,
    pub data: String,
    /// RFC 3339 with offset
    pub timestamp: String,
}

// ============================================================================
// RESOURCE PAYLOADS
// ============================================================================

/// Lightweight reference to a remote entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityRef {
    pub name: String,
    pub id: String,
}

/// Dataset entry in the datasets://all snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetRef {
    pub name: String,
    pub id: String,
    pub size: u64,
    /// Column name to platform type, in platform order
    pub columns: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetsSnapshot {
    pub datasets: Vec<DatasetRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowsSnapshot {
    pub flows: Vec<EntityRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardsSnapshot {
    pub dashboards: Vec<EntityRef>,
    /// Present only when the platform lacks dashboards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartsSnapshot {
    pub charts: Vec<EntityRef>,
    /// Present only when the platform lacks charts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
