//! In-memory [`PlatformApp`] for translator and transport tests.
//!
//! Enable the `test-utils` feature to use it from dependent crates.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::client::PlatformApp;
use crate::error::{Error, Result};
use crate::models::{
    AppHandle, Capability, Chart, ColumnType, Dashboard, Dataset, Flow, FlowStatus, RunLog,
};
use crate::table::Table;

struct FakeFlow {
    flow: Flow,
    /// `None` makes every status read fail.
    status: Option<FlowStatus>,
    /// Outcome of a run; `None` simulates a run that never finishes.
    run_log: Option<RunLog>,
}

/// Scriptable stand-in for a connected platform app.
///
/// Dashboards and charts start out available and empty.
pub struct FakeApp {
    app: AppHandle,
    datasets: Vec<(Dataset, Table)>,
    flows: Vec<FakeFlow>,
    dashboards: Capability<Dashboard>,
    charts: Capability<Chart>,
    failure: Option<String>,
    triggered: Mutex<Vec<String>>,
}

impl FakeApp {
    pub fn new(app_name: &str) -> Self {
        Self {
            app: AppHandle {
                app_id: format!("app-{}", app_name),
                name: app_name.to_string(),
            },
            datasets: Vec::new(),
            flows: Vec::new(),
            dashboards: Capability::Available(Vec::new()),
            charts: Capability::Available(Vec::new()),
            failure: None,
            triggered: Mutex::new(Vec::new()),
        }
    }

    pub fn with_dataset(mut self, dataset: Dataset, table: Table) -> Self {
        self.datasets.push((dataset, table));
        self
    }

    /// Register a flow whose run completes with `run_log`.
    pub fn with_flow(mut self, flow: Flow, status: FlowStatus, run_log: RunLog) -> Self {
        self.flows.push(FakeFlow {
            flow,
            status: Some(status),
            run_log: Some(run_log),
        });
        self
    }

    /// Register a flow whose status cannot be read; runs of it never finish.
    pub fn with_unreadable_flow(mut self, flow: Flow) -> Self {
        self.flows.push(FakeFlow {
            flow,
            status: None,
            run_log: None,
        });
        self
    }

    /// Register a flow whose run never reaches a terminal status.
    pub fn with_stuck_flow(mut self, flow: Flow) -> Self {
        self.flows.push(FakeFlow {
            flow,
            status: Some(FlowStatus::Running),
            run_log: None,
        });
        self
    }

    pub fn with_dashboards(mut self, dashboards: Vec<Dashboard>) -> Self {
        self.dashboards = Capability::Available(dashboards);
        self
    }

    pub fn with_charts(mut self, charts: Vec<Chart>) -> Self {
        self.charts = Capability::Available(charts);
        self
    }

    pub fn without_dashboards(mut self) -> Self {
        self.dashboards = Capability::Unavailable("dashboards not offered".into());
        self
    }

    pub fn without_charts(mut self) -> Self {
        self.charts = Capability::Unavailable("charts not offered".into());
        self
    }

    /// Make every remote call fail with a 500 carrying `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Names of flows whose execution was triggered, in call order.
    pub fn triggered_runs(&self) -> Vec<String> {
        self.triggered
            .lock()
            .map(|runs| runs.clone())
            .unwrap_or_default()
    }

    fn check(&self, path: &str) -> Result<()> {
        match &self.failure {
            Some(message) => Err(Error::Api {
                status: 500,
                path: path.to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlatformApp for FakeApp {
    fn app(&self) -> &AppHandle {
        &self.app
    }

    async fn datasets(&self) -> Result<Vec<Dataset>> {
        self.check("datasets")?;
        Ok(self.datasets.iter().map(|(d, _)| d.clone()).collect())
    }

    async fn dataset_table(&self, dataset: &Dataset, row_limit: usize) -> Result<Table> {
        self.check("dataset download")?;
        self.datasets
            .iter()
            .find(|(d, _)| d.dataset_id == dataset.dataset_id)
            .map(|(_, table)| table.clone().head(row_limit))
            .ok_or_else(|| Error::DatasetNotFound {
                name: dataset.name.clone(),
            })
    }

    async fn flows(&self) -> Result<Vec<Flow>> {
        self.check("flows")?;
        Ok(self.flows.iter().map(|f| f.flow.clone()).collect())
    }

    async fn flow_status(&self, flow: &Flow) -> Result<FlowStatus> {
        self.check("flow status")?;
        let entry = self
            .flows
            .iter()
            .find(|f| f.flow.flow_id == flow.flow_id)
            .ok_or_else(|| Error::FlowNotFound {
                name: flow.name.clone(),
            })?;
        entry.status.clone().ok_or_else(|| Error::Api {
            status: 503,
            path: format!("flow status of {}", flow.flow_id),
            message: "status unavailable".to_string(),
        })
    }

    async fn run_flow(&self, flow: &Flow) -> Result<RunLog> {
        self.check("run flow")?;
        if let Ok(mut runs) = self.triggered.lock() {
            runs.push(flow.name.clone());
        }
        let entry = self
            .flows
            .iter()
            .find(|f| f.flow.flow_id == flow.flow_id)
            .ok_or_else(|| Error::FlowNotFound {
                name: flow.name.clone(),
            })?;
        entry.run_log.clone().ok_or_else(|| Error::RunTimeout {
            flow: flow.name.clone(),
            timeout: Duration::from_secs(1),
        })
    }

    async fn dashboards(&self) -> Result<Capability<Dashboard>> {
        self.check("dashboards")?;
        Ok(self.dashboards.clone())
    }

    async fn charts(&self) -> Result<Capability<Chart>> {
        self.check("charts")?;
        Ok(self.charts.clone())
    }
}

/// Ready-made entities for tests.
pub mod fixtures {
    use super::*;

    /// Dataset with `rows` records over an `id` (numeric) and `label` (text) column.
    pub fn dataset(name: &str, id: &str, rows: usize) -> (Dataset, Table) {
        let dataset = Dataset {
            dataset_id: id.to_string(),
            name: name.to_string(),
            size: rows as u64,
            data_types: vec![
                ColumnType::new("id", "NUMERIC"),
                ColumnType::new("label", "TEXT"),
            ],
        };
        let table = Table::new(
            vec!["id".into(), "label".into()],
            (0..rows)
                .map(|i| vec![json!(i), json!(format!("row-{}", i))])
                .collect(),
        );
        (dataset, table)
    }

    pub fn flow(name: &str, id: &str) -> Flow {
        Flow {
            flow_id: id.to_string(),
            name: name.to_string(),
        }
    }

    /// Run log stamped 2024-01-01T00:00:00Z.
    pub fn run_log(status: FlowStatus, erroneous_facet_id: Option<&str>) -> RunLog {
        RunLog {
            log_id: "log-1".to_string(),
            status,
            user: "me@example.com".to_string(),
            erroneous_facet_id: erroneous_facet_id.map(str::to_string),
            data: String::new(),
            timestamp: DateTime::<Utc>::from_timestamp(1_704_067_200, 0).unwrap_or_default(),
        }
    }

    pub fn dashboard(name: &str, id: &str) -> Dashboard {
        Dashboard {
            dashboard_id: id.to_string(),
            name: name.to_string(),
        }
    }

    pub fn chart(name: &str, id: &str, chart_type: &str) -> Chart {
        Chart {
            chart_id: id.to_string(),
            name: name.to_string(),
            chart_type: chart_type.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[tokio::test]
    async fn lookup_is_exact_and_first_match_wins() {
        let (first, t1) = dataset("sales", "ds-1", 1);
        let (second, t2) = dataset("sales", "ds-2", 2);
        let (other, t3) = dataset("Sales", "ds-3", 3);
        let app = FakeApp::new("demo")
            .with_dataset(first, t1)
            .with_dataset(second, t2)
            .with_dataset(other, t3);

        assert_eq!(app.dataset_by_name("sales").await.unwrap().dataset_id, "ds-1");
        assert_eq!(app.dataset_by_name("Sales").await.unwrap().dataset_id, "ds-3");
        let err = app.dataset_by_name("SALES").await.unwrap_err();
        assert!(matches!(err, Error::DatasetNotFound { .. }));
    }

    #[tokio::test]
    async fn stuck_flow_times_out_and_records_trigger() {
        let app = FakeApp::new("demo").with_stuck_flow(flow("nightly", "f-1"));
        let target = app.flow_by_name("nightly").await.unwrap();
        let err = app.run_flow(&target).await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
        assert_eq!(app.triggered_runs(), vec!["nightly".to_string()]);
    }

    #[tokio::test]
    async fn failing_app_reports_remote_errors() {
        let app = FakeApp::new("demo").failing("boom");
        let err = app.flows().await.unwrap_err();
        assert_eq!(err.kind(), "remote");
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn unreadable_flow_fails_only_its_status() {
        let app = FakeApp::new("demo")
            .with_flow(
                flow("nightly", "f-1"),
                FlowStatus::Idle,
                run_log(FlowStatus::Success, None),
            )
            .with_unreadable_flow(flow("hidden", "f-2"));
        let flows = app.flows().await.unwrap();
        assert_eq!(app.flow_status(&flows[0]).await.unwrap(), FlowStatus::Idle);
        let err = app.flow_status(&flows[1]).await.unwrap_err();
        assert_eq!(err.kind(), "remote");
    }
}
