//! HTTP access to the Ikigai platform and the `PlatformApp` seam.
//!
//! [`IkigaiClient`] owns the authenticated `reqwest` client. Calling
//! [`IkigaiClient::connect`] resolves an application by name once and yields
//! an [`HttpApp`], which is what the rest of the system talks to through the
//! [`PlatformApp`] trait.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::{ClientOptions, Credentials};
use crate::error::{Error, Result};
use crate::models::{AppHandle, Capability, Chart, Dashboard, Dataset, Flow, FlowStatus, RunLog};
use crate::table::Table;

const APPS_FOR_USER: &str = "/component/get-apps-for-user";
const DATASETS_FOR_APP: &str = "/component/get-datasets-for-app";
const DATASET_DOWNLOAD_URL: &str = "/component/get-dataset-download-url";
const FLOWS_FOR_APP: &str = "/component/get-flows-for-app";
const FLOW_STATUS: &str = "/component/get-flow-status";
const RUN_FLOW: &str = "/component/run-flow";
const FLOW_LOG: &str = "/component/get-flow-log";
const DASHBOARDS_FOR_APP: &str = "/component/get-dashboards-for-app";
const CHARTS_FOR_APP: &str = "/component/get-charts-for-app";

/// Longest error body kept in [`Error::Api`] messages.
const MAX_ERROR_BODY: usize = 512;

/// Operations available on the single application this process is bound to.
///
/// Implementations must be safe to call concurrently; the handle is shared
/// read-only across all in-flight requests.
#[async_trait]
pub trait PlatformApp: Send + Sync {
    /// The resolved application.
    fn app(&self) -> &AppHandle;

    async fn datasets(&self) -> Result<Vec<Dataset>>;

    /// Fetch at most `row_limit` rows of a dataset's content.
    async fn dataset_table(&self, dataset: &Dataset, row_limit: usize) -> Result<Table>;

    async fn flows(&self) -> Result<Vec<Flow>>;

    async fn flow_status(&self, flow: &Flow) -> Result<FlowStatus>;

    /// Trigger a run and wait until the platform reports a terminal status.
    async fn run_flow(&self, flow: &Flow) -> Result<RunLog>;

    async fn dashboards(&self) -> Result<Capability<Dashboard>>;

    async fn charts(&self) -> Result<Capability<Chart>>;

    /// Exact, case-sensitive lookup. The first match wins when names repeat.
    async fn dataset_by_name(&self, name: &str) -> Result<Dataset> {
        self.datasets()
            .await?
            .into_iter()
            .find(|dataset| dataset.name == name)
            .ok_or_else(|| Error::DatasetNotFound {
                name: name.to_string(),
            })
    }

    /// Exact, case-sensitive lookup. The first match wins when names repeat.
    async fn flow_by_name(&self, name: &str) -> Result<Flow> {
        self.flows()
            .await?
            .into_iter()
            .find(|flow| flow.name == name)
            .ok_or_else(|| Error::FlowNotFound {
                name: name.to_string(),
            })
    }
}

#[derive(Deserialize)]
struct AppsEnvelope {
    #[serde(default)]
    apps: Vec<AppHandle>,
}

#[derive(Deserialize)]
struct DatasetsEnvelope {
    #[serde(default)]
    datasets: Vec<Dataset>,
}

#[derive(Deserialize)]
struct DownloadUrlEnvelope {
    url: String,
}

#[derive(Deserialize)]
struct FlowsEnvelope {
    #[serde(default)]
    flows: Vec<Flow>,
}

#[derive(Deserialize)]
struct StatusEnvelope {
    status: FlowStatus,
}

#[derive(Deserialize)]
struct FlowLogEnvelope {
    #[serde(default)]
    flow_log: Vec<RunLog>,
}

#[derive(Deserialize)]
struct DashboardsEnvelope {
    #[serde(default)]
    dashboards: Vec<Dashboard>,
}

#[derive(Deserialize)]
struct ChartsEnvelope {
    #[serde(default)]
    charts: Vec<Chart>,
}

/// Authenticated HTTP client for the platform API.
#[derive(Clone)]
pub struct IkigaiClient {
    http: Client,
    /// Unauthenticated client for pre-signed download links.
    download: Client,
    base_url: String,
    options: ClientOptions,
}

impl IkigaiClient {
    pub fn new(credentials: &Credentials, options: ClientOptions) -> Result<Self> {
        let base_url = credentials.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::InvalidBaseUrl {
                url: credentials.base_url.clone(),
            });
        }

        let mut headers = HeaderMap::new();
        let user = HeaderValue::from_str(&credentials.user_email).map_err(|_| {
            Error::InvalidCredentials("user email is not a valid header value".into())
        })?;
        let mut api_key = HeaderValue::from_str(&credentials.api_key)
            .map_err(|_| Error::InvalidCredentials("api key is not a valid header value".into()))?;
        api_key.set_sensitive(true);
        headers.insert("user", user);
        headers.insert("api-key", api_key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let user_agent = concat!("ikigai-mcp/", env!("CARGO_PKG_VERSION"));
        let http = Client::builder()
            .default_headers(headers)
            .timeout(options.request_timeout)
            .user_agent(user_agent)
            .build()?;
        let download = Client::builder()
            .timeout(options.request_timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            http,
            download,
            base_url,
            options,
        })
    }

    /// Resolve `app_name` among the user's apps and bind to it.
    pub async fn connect(self, app_name: &str) -> Result<HttpApp> {
        info!(app = %app_name, "resolving app");
        let listing: AppsEnvelope = self.get_json(APPS_FOR_USER, &[]).await?;
        let app = listing
            .apps
            .into_iter()
            .find(|app| app.name == app_name)
            .ok_or_else(|| Error::AppNotFound {
                name: app_name.to_string(),
            })?;
        info!(app = %app.name, app_id = %app.app_id, "app resolved");
        Ok(HttpApp { client: self, app })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        debug!(path, "GET");
        let response = self.http.get(self.url(path)).query(query).send().await?;
        decode(path, response).await
    }

    /// Like [`Self::get_json`] but maps "endpoint missing" statuses to `None`.
    async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        debug!(path, "GET");
        let response = self.http.get(self.url(path)).query(query).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => {
                debug!(path, status = %response.status(), "endpoint not offered by platform");
                Ok(None)
            }
            _ => decode(path, response).await.map(Some),
        }
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        debug!(path, "POST");
        let response = self.http.post(self.url(path)).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(api_error(path, status, response).await);
        }
        // Trigger endpoints may answer with an empty body.
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| Error::InvalidResponse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Stream a CSV download until the header and `row_limit` records have
    /// arrived, then drop the connection.
    async fn download_csv(&self, url: &str, row_limit: usize) -> Result<Vec<u8>> {
        let target = if url.starts_with('/') {
            self.url(url)
        } else {
            url.to_string()
        };
        let response = self.download.get(&target).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(api_error("dataset download", status, response).await);
        }

        let mut body = response.bytes_stream();
        let mut buffer = Vec::new();
        while let Some(chunk) = body.next().await {
            buffer.extend_from_slice(&chunk?);
            if let Some(end) = Table::complete_prefix(&buffer, row_limit) {
                debug!(bytes = end, row_limit, "row limit reached; closing download");
                buffer.truncate(end);
                return Ok(buffer);
            }
        }
        Ok(buffer)
    }
}

async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(api_error(path, status, response).await);
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| Error::InvalidResponse {
        path: path.to_string(),
        message: e.to_string(),
    })
}

async fn api_error(path: &str, status: StatusCode, response: Response) -> Error {
    let mut message = response.text().await.unwrap_or_default();
    if message.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
        message.push('…');
    }
    if message.trim().is_empty() {
        message = status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string();
    }
    Error::Api {
        status: status.as_u16(),
        path: path.to_string(),
        message,
    }
}

/// A [`PlatformApp`] backed by the live platform API.
#[derive(Clone)]
pub struct HttpApp {
    client: IkigaiClient,
    app: AppHandle,
}

impl HttpApp {
    fn app_query(&self) -> [(&str, &str); 1] {
        [("app_id", self.app.app_id.as_str())]
    }

    async fn latest_run_log(&self, flow: &Flow) -> Result<Option<RunLog>> {
        let logs: FlowLogEnvelope = self
            .client
            .get_json(
                FLOW_LOG,
                &[
                    ("app_id", self.app.app_id.as_str()),
                    ("flow_id", flow.flow_id.as_str()),
                    ("max_count", "1"),
                ],
            )
            .await?;
        Ok(logs.flow_log.into_iter().next())
    }

    async fn run_to_completion(&self, flow: &Flow) -> Result<RunLog> {
        let previous = self.latest_run_log(flow).await?.map(|log| log.log_id);

        let body = json!({
            "flow": {
                "app_id": self.app.app_id,
                "flow_id": flow.flow_id,
            }
        });
        self.client.post_json(RUN_FLOW, &body).await?;
        info!(flow = %flow.name, flow_id = %flow.flow_id, "flow run triggered");

        let poll_interval = self.client.options.poll_interval;
        loop {
            tokio::time::sleep(poll_interval).await;
            let status = self.flow_status(flow).await?;
            debug!(flow = %flow.name, %status, "polled flow status");
            if !status.is_terminal() {
                continue;
            }
            // The status can read terminal before the new run is registered;
            // only a log newer than the pre-trigger one belongs to this run.
            match self.latest_run_log(flow).await? {
                Some(log) if Some(&log.log_id) != previous.as_ref() => return Ok(log),
                _ => debug!(flow = %flow.name, "waiting for run log of the new run"),
            }
        }
    }
}

#[async_trait]
impl PlatformApp for HttpApp {
    fn app(&self) -> &AppHandle {
        &self.app
    }

    async fn datasets(&self) -> Result<Vec<Dataset>> {
        let listing: DatasetsEnvelope = self
            .client
            .get_json(DATASETS_FOR_APP, &self.app_query())
            .await?;
        Ok(listing.datasets)
    }

    async fn dataset_table(&self, dataset: &Dataset, row_limit: usize) -> Result<Table> {
        let link: DownloadUrlEnvelope = self
            .client
            .get_json(
                DATASET_DOWNLOAD_URL,
                &[
                    ("app_id", self.app.app_id.as_str()),
                    ("dataset_id", dataset.dataset_id.as_str()),
                ],
            )
            .await?;
        let bytes = self.client.download_csv(&link.url, row_limit).await?;
        debug!(dataset = %dataset.name, bytes = bytes.len(), "dataset content downloaded");
        Table::from_csv(&bytes, &dataset.data_types, row_limit)
    }

    async fn flows(&self) -> Result<Vec<Flow>> {
        let listing: FlowsEnvelope = self
            .client
            .get_json(FLOWS_FOR_APP, &self.app_query())
            .await?;
        Ok(listing.flows)
    }

    async fn flow_status(&self, flow: &Flow) -> Result<FlowStatus> {
        let envelope: StatusEnvelope = self
            .client
            .get_json(
                FLOW_STATUS,
                &[
                    ("app_id", self.app.app_id.as_str()),
                    ("flow_id", flow.flow_id.as_str()),
                ],
            )
            .await?;
        Ok(envelope.status)
    }

    async fn run_flow(&self, flow: &Flow) -> Result<RunLog> {
        let timeout: Duration = self.client.options.run_timeout;
        match tokio::time::timeout(timeout, self.run_to_completion(flow)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(flow = %flow.name, timeout_secs = timeout.as_secs(), "flow run timed out");
                Err(Error::RunTimeout {
                    flow: flow.name.clone(),
                    timeout,
                })
            }
        }
    }

    async fn dashboards(&self) -> Result<Capability<Dashboard>> {
        let listing: Option<DashboardsEnvelope> = self
            .client
            .get_optional(DASHBOARDS_FOR_APP, &self.app_query())
            .await?;
        Ok(match listing {
            Some(listing) => Capability::Available(listing.dashboards),
            None => Capability::Unavailable("dashboards endpoint not offered by platform".into()),
        })
    }

    async fn charts(&self) -> Result<Capability<Chart>> {
        let listing: Option<ChartsEnvelope> = self
            .client
            .get_optional(CHARTS_FOR_APP, &self.app_query())
            .await?;
        Ok(match listing {
            Some(listing) => Capability::Available(listing.charts),
            None => Capability::Unavailable("charts endpoint not offered by platform".into()),
        })
    }
}
