//! MCP server handler over the connected app
//!
//! [`McpServerState`] implements `rmcp`'s [`ServerHandler`]: the six tools
//! are registered through the tool router and the four resources are served
//! by `list_resources`/`read_resource`. Protocol framing, version negotiation
//! and sessions belong to `rmcp`.

use std::sync::Arc;

use ikigai_lib::PlatformApp;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    AnnotateAble, CallToolResult, Content, Implementation, ListResourcesResult,
    PaginatedRequestParams, ProtocolVersion, RawResource, ReadResourceRequestParams,
    ReadResourceResult, Resource, ResourceContents, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, RoleServer, ServerHandler};
use tracing::{info, warn};

use crate::resources::{ChartsResource, DashboardsResource, DatasetsResource, FlowsResource};
use crate::tools::*;
use crate::types::{DownloadDatasetInput, RunFlowInput};
use crate::Error;

pub const SERVER_NAME: &str = "ikigai-mcp";
pub const RESOURCE_MIME_TYPE: &str = "application/json";

/// Main server state shared by all sessions
///
/// Cloning is cheap; the app handle is reference counted and immutable
/// after startup.
#[derive(Clone)]
pub struct McpServerState {
    app: Arc<dyn PlatformApp>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl McpServerState {
    pub fn new(app: Arc<dyn PlatformApp>) -> Self {
        Self {
            app,
            tool_router: Self::tool_router(),
        }
    }

    /// The connected app handle
    pub fn app(&self) -> &dyn PlatformApp {
        self.app.as_ref()
    }

    #[tool(
        description = "List all available datasets",
        annotations(title = "List Datasets", read_only_hint = true, open_world_hint = true)
    )]
    async fn list_datasets(&self) -> Result<CallToolResult, McpError> {
        info!(tool = "list_datasets", "tool call");
        Ok(tool_result("list_datasets", ListDatasetsTool::execute(self.app()).await))
    }

    #[tool(
        description = "Download the first 10 rows of a dataset as JSON",
        annotations(title = "Download Dataset", read_only_hint = true, open_world_hint = true)
    )]
    async fn download_dataset(
        &self,
        Parameters(input): Parameters<DownloadDatasetInput>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "download_dataset", dataset_name = %input.dataset_name, "tool call");
        Ok(tool_result(
            "download_dataset",
            DownloadDatasetTool::execute(self.app(), input).await,
        ))
    }

    #[tool(
        description = "List all available flows with their current status",
        annotations(title = "List Flows", read_only_hint = true, open_world_hint = true)
    )]
    async fn list_flows(&self) -> Result<CallToolResult, McpError> {
        info!(tool = "list_flows", "tool call");
        Ok(tool_result("list_flows", ListFlowsTool::execute(self.app()).await))
    }

    #[tool(
        description = "Run a flow, wait for it to finish and return its run log",
        annotations(
            title = "Run Flow",
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = false,
            open_world_hint = true
        )
    )]
    async fn run_flow(
        &self,
        Parameters(input): Parameters<RunFlowInput>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "run_flow", flow_name = %input.flow_name, "tool call");
        Ok(tool_result("run_flow", RunFlowTool::execute(self.app(), input).await))
    }

    #[tool(
        description = "List all available dashboards",
        annotations(title = "List Dashboards", read_only_hint = true, open_world_hint = true)
    )]
    async fn list_dashboards(&self) -> Result<CallToolResult, McpError> {
        info!(tool = "list_dashboards", "tool call");
        Ok(tool_result("list_dashboards", ListDashboardsTool::execute(self.app()).await))
    }

    #[tool(
        description = "List all available charts",
        annotations(title = "List Charts", read_only_hint = true, open_world_hint = true)
    )]
    async fn list_charts(&self) -> Result<CallToolResult, McpError> {
        info!(tool = "list_charts", "tool call");
        Ok(tool_result("list_charts", ListChartsTool::execute(self.app()).await))
    }
}

impl McpServerState {
    /// Resources exposed by this server, in listing order
    pub fn resources(&self) -> Vec<Resource> {
        [
            (
                DatasetsResource::URI,
                "Datasets",
                "All datasets in the app with size and column types",
            ),
            (FlowsResource::URI, "Flows", "All flows in the app"),
            (DashboardsResource::URI, "Dashboards", "All dashboards in the app"),
            (ChartsResource::URI, "Charts", "All charts in the app"),
        ]
        .into_iter()
        .map(|(uri, name, description)| {
            let mut resource = RawResource::new(uri, name);
            resource.description = Some(description.to_string());
            resource.mime_type = Some(RESOURCE_MIME_TYPE.to_string());
            resource.no_annotation()
        })
        .collect()
    }

    /// Read one resource by URI.
    pub async fn read(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        info!(uri, "resource read");
        let app = self.app();
        let outcome = match uri {
            DatasetsResource::URI => DatasetsResource::read(app).await,
            FlowsResource::URI => FlowsResource::read(app).await,
            DashboardsResource::URI => DashboardsResource::read(app).await,
            ChartsResource::URI => ChartsResource::read(app).await,
            unknown => {
                return Err(McpError::resource_not_found(
                    format!("Unknown resource: {}", unknown),
                    None,
                ));
            }
        };

        match outcome {
            Ok(text) => {
                let mut contents = ResourceContents::text(text, uri);
                if let ResourceContents::TextResourceContents { mime_type, .. } = &mut contents {
                    *mime_type = Some(RESOURCE_MIME_TYPE.to_string());
                }
                Ok(ReadResourceResult {
                    contents: vec![contents],
                })
            }
            Err(err) => {
                warn!(uri, kind = err.kind(), error = %err, "resource read failed");
                Err(problem_to_mcp(err))
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for McpServerState {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(format!(
                "Datasets, flows, dashboards and charts of the Ikigai app '{}'.",
                self.app.app().name
            )),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult {
            resources: self.resources(),
            next_cursor: None,
            ..Default::default()
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        self.read(&request.uri).await
    }
}

/// Tool failures are results flagged `isError`, not protocol errors.
fn tool_result(tool: &str, outcome: crate::Result<String>) -> CallToolResult {
    match outcome {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(err) => {
            warn!(tool, kind = err.kind(), error = %err, "tool call failed");
            CallToolResult::error(vec![Content::text(format!("Error: {}", err.message))])
        }
    }
}

fn problem_to_mcp(err: Error) -> McpError {
    let data = serde_json::to_value(&err).ok();
    McpError::internal_error(err.message, data)
}
