//! MCP resource implementations for the connected app
//!
//! This module defines the four resources exposed by the MCP server:
//! - datasets://all: Dataset names, ids, sizes and column types
//! - flows://all: Flow names and ids
//! - dashboards://all: Dashboard names and ids
//! - charts://all: Chart names and ids
//!
//! Every read is a fresh snapshot; nothing is cached between reads.

use ikigai_lib::{Capability, PlatformApp};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::types::*;
use crate::Result;

fn to_json<T: Serialize>(payload: &T) -> Result<String> {
    serde_json::to_string(payload).map_err(|e| crate::Error::internal(e.to_string()))
}

/// Datasets snapshot resource
pub struct DatasetsResource;

impl DatasetsResource {
    pub const URI: &'static str = "datasets://all";

    pub async fn read(app: &dyn PlatformApp) -> Result<String> {
        let datasets = app
            .datasets()
            .await?
            .into_iter()
            .map(|dataset| {
                let columns: Map<String, Value> = dataset
                    .data_types
                    .into_iter()
                    .map(|c| (c.column, Value::String(c.data_type)))
                    .collect();
                DatasetRef {
                    name: dataset.name,
                    id: dataset.dataset_id,
                    size: dataset.size,
                    columns,
                }
            })
            .collect();
        to_json(&DatasetsSnapshot { datasets })
    }
}

/// Flows snapshot resource
///
/// Carries no status; list_flows reports it.
pub struct FlowsResource;

impl FlowsResource {
    pub const URI: &'static str = "flows://all";

    pub async fn read(app: &dyn PlatformApp) -> Result<String> {
        let flows = app
            .flows()
            .await?
            .into_iter()
            .map(|f| EntityRef {
                name: f.name,
                id: f.flow_id,
            })
            .collect();
        to_json(&FlowsSnapshot { flows })
    }
}

/// Dashboards snapshot resource
pub struct DashboardsResource;

impl DashboardsResource {
    pub const URI: &'static str = "dashboards://all";

    pub async fn read(app: &dyn PlatformApp) -> Result<String> {
        let snapshot = match app.dashboards().await? {
            Capability::Available(dashboards) => DashboardsSnapshot {
                dashboards: dashboards
                    .into_iter()
                    .map(|d| EntityRef {
                        name: d.name,
                        id: d.dashboard_id,
                    })
                    .collect(),
                message: None,
            },
            Capability::Unavailable(reason) => {
                debug!(%reason, "dashboards resource unavailable");
                DashboardsSnapshot {
                    dashboards: Vec::new(),
                    message: Some("Dashboards not available".to_string()),
                }
            }
        };
        to_json(&snapshot)
    }
}

/// Charts snapshot resource
pub struct ChartsResource;

impl ChartsResource {
    pub const URI: &'static str = "charts://all";

    pub async fn read(app: &dyn PlatformApp) -> Result<String> {
        let snapshot = match app.charts().await? {
            Capability::Available(charts) => ChartsSnapshot {
                charts: charts
                    .into_iter()
                    .map(|c| EntityRef {
                        name: c.name,
                        id: c.chart_id,
                    })
                    .collect(),
                message: None,
            },
            Capability::Unavailable(reason) => {
                debug!(%reason, "charts resource unavailable");
                ChartsSnapshot {
                    charts: Vec::new(),
                    message: Some("Charts not available".to_string()),
                }
            }
        };
        to_json(&snapshot)
    }
}
