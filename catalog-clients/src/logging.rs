//! Cloud Logging sink management for the audit-log export. The sink streams
//! Data Catalog and Dataplex data-access entries into the warehouse dataset,
//! where the analytics views pick them up.

use serde::Deserialize;
use serde::Serialize;
use serde_json::json;

use transfer_gcp_auth::SharedTokenProvider;

use crate::error::ApiError;
use crate::http::RestClient;

const LOGGING_BASE_URL: &str = "https://logging.googleapis.com";

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogSink {
    pub name: String,
    pub destination: String,
    #[serde(default)]
    pub filter: String,
    #[serde(default)]
    pub writer_identity: Option<String>,
}

pub struct LoggingClient {
    rest: RestClient,
    base_url: String,
}

impl LoggingClient {
    pub fn new(tokens: SharedTokenProvider) -> Self {
        Self {
            rest: RestClient::new(tokens),
            base_url: LOGGING_BASE_URL.to_string(),
        }
    }

    /// Test seam: point the adapter at a fake Cloud Logging endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.base_url = base_url;
        self
    }

    /// Creates an export sink into `dataset` with partitioned tables and a
    /// dedicated writer identity. An already existing sink is not an error;
    /// the current definition is fetched and returned instead.
    pub async fn create_sink(
        &self,
        project: &str,
        sink_name: &str,
        dataset: &str,
        filter: &str,
    ) -> Result<LogSink, ApiError> {
        let url = format!("{}/v2/projects/{project}/sinks", self.base_url);
        let body = json!({
            "name": sink_name,
            "destination": format!(
                "bigquery.googleapis.com/projects/{project}/datasets/{dataset}"
            ),
            "filter": filter,
            "includeChildren": true,
            "bigqueryOptions": { "usePartitionedTables": true },
        });
        match self
            .rest
            .post_json_with_query(&url, &[("uniqueWriterIdentity", "true")], &body, "create sink")
            .await
        {
            Ok(sink) => Ok(sink),
            Err(ApiError::Status { status, .. }) if status == reqwest::StatusCode::CONFLICT => {
                self.get_sink(project, sink_name).await
            }
            Err(err) => Err(err),
        }
    }

    pub async fn get_sink(&self, project: &str, sink_name: &str) -> Result<LogSink, ApiError> {
        let url = format!("{}/v2/projects/{project}/sinks/{sink_name}", self.base_url);
        self.rest.get_json(&url, &[], "get sink").await
    }
}
