//! MCP (Model Context Protocol) server for an Ikigai app
//!
//! This crate exposes one Ikigai application's datasets, flows, dashboards
//! and charts to AI agents as MCP tools and resources, served over
//! streamable HTTP.
//!
//! # Architecture
//!
//! The server is organized into the following submodules:
//! - `server`: `rmcp` server handler over an injected [`ikigai_lib::PlatformApp`]
//! - `tools`: Tool implementations (list_datasets, download_dataset, list_flows,
//!   run_flow, list_dashboards, list_charts)
//! - `resources`: Resource implementations (datasets://all, flows://all,
//!   dashboards://all, charts://all)
//! - `transport`: axum router hosting `rmcp`'s streamable HTTP service
//! - `error`: Error types and RFC 9457 problem details
//!
//! # Transport
//!
//! MCP streamable HTTP at a single path. Clients `POST` JSON-RPC messages,
//! receive responses as SSE streams, and carry the `Mcp-Session-Id` issued
//! by `initialize`. Logging goes to stderr.

#![deny(warnings)]

pub mod config;
pub mod error;
pub mod logging;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::ServerArgs;
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use server::McpServerState;
pub use transport::{router, serve, ServeConfig};
