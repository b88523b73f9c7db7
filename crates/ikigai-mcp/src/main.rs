use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use ikigai_lib::PlatformApp;
use ikigai_mcp::{init_logging, serve, McpServerState, ServerArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();
    init_logging(&args.logging_config()).context("failed to initialize logging")?;

    info!(
        base_url = %args.base_url,
        user = %args.user_email,
        app = %args.app_name,
        "connecting to Ikigai"
    );

    let app = ikigai_lib::connect(&args.credentials(), &args.app_name, args.client_options())
        .await
        .with_context(|| format!("failed to connect to app '{}'", args.app_name))?;
    info!(app_id = %app.app().app_id, "app resolved");

    let state = McpServerState::new(Arc::new(app));
    serve(state, &args.serve_config())
        .await
        .context("MCP server terminated with an error")?;

    Ok(())
}
