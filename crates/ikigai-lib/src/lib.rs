//! Ikigai platform client entry points.
//!
//! This crate resolves one application on the platform and exposes the
//! read/run operations the MCP server needs through the [`PlatformApp`]
//! trait. Higher-level consumers should hold an `Arc<dyn PlatformApp>` and
//! never talk HTTP themselves.
//!

#![deny(warnings)]

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod table;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use client::{HttpApp, IkigaiClient, PlatformApp};
pub use config::{ClientOptions, Credentials};
pub use error::{Error, Result};
pub use models::{
    AppHandle, Capability, Chart, ColumnType, Dashboard, Dataset, Flow, FlowStatus, RunLog,
};
pub use table::Table;

/// Build a client from `credentials` and bind it to `app_name`.
///
/// Fails with [`Error::AppNotFound`] when the user has no app of that name.
pub async fn connect(
    credentials: &Credentials,
    app_name: &str,
    options: ClientOptions,
) -> Result<HttpApp> {
    IkigaiClient::new(credentials, options)?
        .connect(app_name)
        .await
}
