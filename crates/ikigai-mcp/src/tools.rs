//! MCP tool implementations for the connected Ikigai app
//!
//! This module defines the six tools exposed by the MCP server:
//! - list_datasets, list_flows, list_dashboards, list_charts: human-readable listings
//! - download_dataset: JSON preview of a dataset's first rows
//! - run_flow: execute a flow and return its run log as JSON
//!
//! Every tool is stateless and receives the app handle explicitly.

use std::fmt::Write as _;

use futures::stream::{self, StreamExt};
use ikigai_lib::{Capability, ColumnType, PlatformApp};
use tracing::{debug, info};

use crate::types::*;
use crate::Error;

/// Rows returned by download_dataset, regardless of dataset size.
pub const DOWNLOAD_ROW_LIMIT: usize = 10;

/// Flow status requests in flight at once during list_flows.
const STATUS_CONCURRENCY: usize = 4;

/// Reject empty or whitespace-only names before any remote call.
fn require_name<'a>(param: &str, value: &'a str) -> crate::Result<&'a str> {
    if value.trim().is_empty() {
        return Err(Error::invalid_param(param, "Cannot be empty"));
    }
    Ok(value)
}

fn listing(kind: &str, lines: &[String]) -> String {
    let mut out = format!("Found {} {}:", lines.len(), kind);
    for line in lines {
        out.push('\n');
        out.push_str(line);
    }
    out
}

pub(crate) fn format_column_types(types: &[ColumnType]) -> String {
    let mut out = String::from("{");
    for (idx, column) in types.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{}: {}", column.column, column.data_type);
    }
    out.push('}');
    out
}

/// Dataset listing tool handler
pub struct ListDatasetsTool;

impl ListDatasetsTool {
    pub async fn execute(app: &dyn PlatformApp) -> crate::Result<String> {
        info!("Listing datasets");
        let datasets = app.datasets().await?;
        let lines: Vec<String> = datasets
            .iter()
            .map(|dataset| {
                format!(
                    "- {} (ID: {}): Size: {}: Data Types: {}",
                    dataset.name,
                    dataset.dataset_id,
                    dataset.size,
                    format_column_types(&dataset.data_types)
                )
            })
            .collect();
        Ok(listing("datasets", &lines))
    }
}

/// Dataset preview tool handler
///
/// Returns at most [`DOWNLOAD_ROW_LIMIT`] rows. There is no way to request
/// further rows through this tool.
pub struct DownloadDatasetTool;

impl DownloadDatasetTool {
    pub async fn execute(app: &dyn PlatformApp, input: DownloadDatasetInput) -> crate::Result<String> {
        let name = require_name("dataset_name", &input.dataset_name)?;
        info!(dataset = %name, "Downloading dataset preview");

        let dataset = app.dataset_by_name(name).await?;
        let table = app
            .dataset_table(&dataset, DOWNLOAD_ROW_LIMIT)
            .await?
            .head(DOWNLOAD_ROW_LIMIT);

        let output = DownloadDatasetOutput {
            dataset_name: dataset.name,
            row_count: table.row_count(),
            column_count: table.column_count(),
            columns: table.columns,
            data: table.rows,
        };
        debug!(rows = output.row_count, columns = output.column_count, "dataset preview ready");
        serde_json::to_string(&output).map_err(|e| Error::internal(e.to_string()))
    }
}

/// Flow listing tool handler
pub struct ListFlowsTool;

impl ListFlowsTool {
    pub async fn execute(app: &dyn PlatformApp) -> crate::Result<String> {
        info!("Listing flows");
        let flows = app.flows().await?;
        let status_futures: Vec<_> = flows.iter().map(|flow| app.flow_status(flow)).collect();
        let statuses: Vec<_> = stream::iter(status_futures)
            .buffered(STATUS_CONCURRENCY)
            .collect()
            .await;

        let lines: Vec<String> = flows
            .iter()
            .zip(statuses)
            .map(|(flow, status)| match status {
                Ok(status) => format!("- {} (ID: {}): Status: {}", flow.name, flow.flow_id, status),
                Err(e) => {
                    debug!(flow = %flow.name, error = %e, "flow status unavailable");
                    format!("- {} (ID: {})", flow.name, flow.flow_id)
                }
            })
            .collect();
        Ok(listing("flows", &lines))
    }
}

/// Flow execution tool handler
///
/// Blocks until the platform reports a terminal status or the configured
/// run timeout expires. A failed run is still a successful tool call.
pub struct RunFlowTool;

impl RunFlowTool {
    pub async fn execute(app: &dyn PlatformApp, input: RunFlowInput) -> crate::Result<String> {
        let name = require_name("flow_name", &input.flow_name)?;
        info!(flow = %name, "Running flow");

        let flow = app.flow_by_name(name).await?;
        let log = app.run_flow(&flow).await?;
        info!(flow = %flow.name, status = %log.status, log_id = %log.log_id, "flow run finished");

        let output = RunFlowOutput {
            flow_name: flow.name,
            status: log.status.to_string(),
            log_id: log.log_id,
            user: log.user,
            erroneous_facet_id: log.erroneous_facet_id,
            data: log.data,
            timestamp: log.timestamp.to_rfc3339(),
        };
        serde_json::to_string(&output).map_err(|e| Error::internal(e.to_string()))
    }
}

/// Dashboard listing tool handler
pub struct ListDashboardsTool;

impl ListDashboardsTool {
    pub const UNAVAILABLE: &'static str =
        "Dashboards functionality is not available in the current Ikigai API.";

    pub async fn execute(app: &dyn PlatformApp) -> crate::Result<String> {
        info!("Listing dashboards");
        match app.dashboards().await? {
            Capability::Available(dashboards) => {
                let lines: Vec<String> = dashboards
                    .iter()
                    .map(|d| format!("- {} (ID: {})", d.name, d.dashboard_id))
                    .collect();
                Ok(listing("dashboards", &lines))
            }
            Capability::Unavailable(reason) => {
                debug!(%reason, "dashboards unavailable");
                Ok(Self::UNAVAILABLE.to_string())
            }
        }
    }
}

/// Chart listing tool handler
pub struct ListChartsTool;

impl ListChartsTool {
    pub const UNAVAILABLE: &'static str =
        "Charts functionality is not available in the current Ikigai API.";

    pub async fn execute(app: &dyn PlatformApp) -> crate::Result<String> {
        info!("Listing charts");
        match app.charts().await? {
            Capability::Available(charts) => {
                let lines: Vec<String> = charts
                    .iter()
                    .map(|c| format!("- {} (ID: {}): Type: {}", c.name, c.chart_id, c.chart_type))
                    .collect();
                Ok(listing("charts", &lines))
            }
            Capability::Unavailable(reason) => {
                debug!(%reason, "charts unavailable");
                Ok(Self::UNAVAILABLE.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ikigai_lib::test_utils::{fixtures, FakeApp};
    use ikigai_lib::FlowStatus;
    use serde_json::{json, Value};

    fn catalog() -> FakeApp {
        let (sales, sales_rows) = fixtures::dataset("sales", "ds-1", 3);
        let (events, event_rows) = fixtures::dataset("events", "ds-2", 50);
        FakeApp::new("demo")
            .with_dataset(sales, sales_rows)
            .with_dataset(events, event_rows)
            .with_flow(
                fixtures::flow("nightly", "f-1"),
                FlowStatus::Idle,
                fixtures::run_log(FlowStatus::Success, None),
            )
            .with_flow(
                fixtures::flow("broken", "f-2"),
                FlowStatus::Failed,
                fixtures::run_log(FlowStatus::Failed, Some("facet-4")),
            )
    }

    #[tokio::test]
    async fn test_list_datasets_format() {
        let app = catalog();
        let text = ListDatasetsTool::execute(&app).await.unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Found 2 datasets:"));
        assert_eq!(
            lines.next(),
            Some("- sales (ID: ds-1): Size: 3: Data Types: {id: NUMERIC, label: TEXT}")
        );
        assert!(lines.next().unwrap().starts_with("- events (ID: ds-2)"));
        assert_eq!(lines.next(), None);
    }

    #[tokio::test]
    async fn test_empty_listings_are_not_errors() {
        let app = FakeApp::new("empty");
        assert_eq!(ListDatasetsTool::execute(&app).await.unwrap(), "Found 0 datasets:");
        assert_eq!(ListFlowsTool::execute(&app).await.unwrap(), "Found 0 flows:");
        assert_eq!(ListDashboardsTool::execute(&app).await.unwrap(), "Found 0 dashboards:");
        assert_eq!(ListChartsTool::execute(&app).await.unwrap(), "Found 0 charts:");
    }

    #[tokio::test]
    async fn test_unavailable_capabilities_use_sentinel() {
        let app = FakeApp::new("legacy").without_dashboards().without_charts();
        let dashboards = ListDashboardsTool::execute(&app).await.unwrap();
        let charts = ListChartsTool::execute(&app).await.unwrap();
        assert_eq!(dashboards, ListDashboardsTool::UNAVAILABLE);
        assert_eq!(charts, ListChartsTool::UNAVAILABLE);
        assert!(!dashboards.starts_with("Found"));
    }

    #[tokio::test]
    async fn test_list_dashboards_and_charts() {
        let app = FakeApp::new("demo")
            .with_dashboards(vec![fixtures::dashboard("Ops", "d-1")])
            .with_charts(vec![fixtures::chart("Revenue", "c-1", "line")]);
        assert_eq!(
            ListDashboardsTool::execute(&app).await.unwrap(),
            "Found 1 dashboards:\n- Ops (ID: d-1)"
        );
        assert_eq!(
            ListChartsTool::execute(&app).await.unwrap(),
            "Found 1 charts:\n- Revenue (ID: c-1): Type: line"
        );
    }

    #[tokio::test]
    async fn test_list_flows_is_stable() {
        let app = catalog();
        let first = ListFlowsTool::execute(&app).await.unwrap();
        let second = ListFlowsTool::execute(&app).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            "Found 2 flows:\n- nightly (ID: f-1): Status: IDLE\n- broken (ID: f-2): Status: FAILED"
        );
    }

    #[tokio::test]
    async fn test_list_flows_omits_unreadable_status() {
        let app = catalog().with_unreadable_flow(fixtures::flow("hidden", "f-3"));
        let text = ListFlowsTool::execute(&app).await.unwrap();
        assert_eq!(
            text,
            "Found 3 flows:\n\
             - nightly (ID: f-1): Status: IDLE\n\
             - broken (ID: f-2): Status: FAILED\n\
             - hidden (ID: f-3)"
        );
    }

    #[tokio::test]
    async fn test_list_flows_keeps_order_across_many_flows() {
        let app = (0..20).fold(FakeApp::new("busy"), |app, i| {
            app.with_flow(
                fixtures::flow(&format!("flow-{i}"), &format!("f-{i}")),
                FlowStatus::Scheduled,
                fixtures::run_log(FlowStatus::Success, None),
            )
        });
        let text = ListFlowsTool::execute(&app).await.unwrap();
        let lines: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(lines.len(), 20);
        assert_eq!(lines[0], "- flow-0 (ID: f-0): Status: SCHEDULED");
        assert_eq!(lines[19], "- flow-19 (ID: f-19): Status: SCHEDULED");
    }

    #[tokio::test]
    async fn test_download_small_dataset() {
        let app = catalog();
        let text = DownloadDatasetTool::execute(
            &app,
            DownloadDatasetInput {
                dataset_name: "sales".into(),
            },
        )
        .await
        .unwrap();
        let output: DownloadDatasetOutput = serde_json::from_str(&text).unwrap();
        assert_eq!(output.row_count, 3);
        assert_eq!(output.column_count, 2);
        assert_eq!(output.columns, ["id", "label"]);
        assert_eq!(output.data[2], vec![json!(2), json!("row-2")]);
    }

    #[tokio::test]
    async fn test_download_caps_rows_at_ten() {
        let app = catalog();
        let text = DownloadDatasetTool::execute(
            &app,
            DownloadDatasetInput {
                dataset_name: "events".into(),
            },
        )
        .await
        .unwrap();
        let output: DownloadDatasetOutput = serde_json::from_str(&text).unwrap();
        assert_eq!(output.row_count, 10);
        assert_eq!(output.data.len(), 10);
    }

    #[tokio::test]
    async fn test_download_missing_dataset() {
        let app = catalog();
        let err = DownloadDatasetTool::execute(
            &app,
            DownloadDatasetInput {
                dataset_name: "X".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert!(err.message.contains("'X'"));
    }

    #[tokio::test]
    async fn test_empty_names_fail_validation_before_remote_call() {
        // A failing app proves no remote call is made
        let app = FakeApp::new("demo").failing("should not be reached");
        let err = DownloadDatasetTool::execute(
            &app,
            DownloadDatasetInput {
                dataset_name: "   ".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "validation");

        let err = RunFlowTool::execute(
            &app,
            RunFlowInput {
                flow_name: String::new(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(app.triggered_runs().is_empty());
    }

    #[tokio::test]
    async fn test_run_flow_success() {
        let app = catalog();
        let text = RunFlowTool::execute(
            &app,
            RunFlowInput {
                flow_name: "nightly".into(),
            },
        )
        .await
        .unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["flow_name"], "nightly");
        assert_eq!(value["status"], "SUCCESS");
        assert!(value["erroneous_facet_id"].is_null());
        assert_eq!(value["timestamp"], "2024-01-01T00:00:00+00:00");
        assert_eq!(value["data"], "");
    }

    #[tokio::test]
    async fn test_failed_run_is_not_an_error() {
        let app = catalog();
        let text = RunFlowTool::execute(
            &app,
            RunFlowInput {
                flow_name: "broken".into(),
            },
        )
        .await
        .unwrap();
        let output: RunFlowOutput = serde_json::from_str(&text).unwrap();
        assert_eq!(output.status, "FAILED");
        assert_eq!(output.erroneous_facet_id.as_deref(), Some("facet-4"));
    }

    #[tokio::test]
    async fn test_run_missing_flow_has_no_side_effect() {
        let app = catalog();
        let err = RunFlowTool::execute(
            &app,
            RunFlowInput {
                flow_name: "X".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert!(err.message.contains("X"));
        assert!(app.triggered_runs().is_empty());
    }

    #[tokio::test]
    async fn test_run_flow_timeout() {
        let app = FakeApp::new("demo").with_stuck_flow(fixtures::flow("forever", "f-9"));
        let err = RunFlowTool::execute(
            &app,
            RunFlowInput {
                flow_name: "forever".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "timeout");
    }

    #[tokio::test]
    async fn test_remote_failure_surfaces_message() {
        let app = FakeApp::new("demo").failing("gateway down");
        let err = ListDatasetsTool::execute(&app).await.unwrap_err();
        assert_eq!(err.kind(), "remote");
        assert!(err.message.contains("gateway down"));
    }
}
