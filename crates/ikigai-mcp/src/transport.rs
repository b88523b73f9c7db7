//! Streamable HTTP transport
//!
//! `rmcp`'s [`StreamableHttpService`] is mounted at the configured path of an
//! axum router. It owns the protocol surface: JSON-RPC framing, sessions,
//! SSE response streams and `202 Accepted` for notifications. This module
//! adds request tracing and the serve loop.

use std::net::SocketAddr;

use axum::http::{HeaderMap, Request};
use axum::Router;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::server::McpServerState;

/// Where the server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    /// Endpoint path, always starting with `/`
    pub path: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            path: "/mcp".to_string(),
        }
    }
}

/// Use the caller's `X-Request-ID` or generate a UUID v7.
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::now_v7().to_string())
}

/// Build the MCP router mounted at `path`.
///
/// Every session gets a clone of `state`; all clones share one app handle.
pub fn router(state: McpServerState, path: &str) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(state.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    // axum does not nest at the root
    let router = if path == "/" {
        Router::new().fallback_service(service)
    } else {
        Router::new().nest_service(path, service)
    };

    router.layer(TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
        info_span!(
            "mcp_http",
            request_id = %request_id(req.headers()),
            method = %req.method(),
            path = %req.uri().path(),
        )
    }))
}

/// Serve until ctrl-c, then drain in-flight requests.
pub async fn serve(state: McpServerState, config: &ServeConfig) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    info!(addr = %addr, path = %config.path, "MCP server listening");

    axum::serve(listener, router(state, &config.path))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received shutdown signal"),
        Err(e) => {
            warn!(error = %e, "unable to listen for ctrl-c; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
