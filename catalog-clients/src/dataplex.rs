//! Dataplex adapter. The mapping stage probes for the migrated twin of each
//! legacy resource; the policy stage reads IAM bindings from the Dataplex
//! side. Reads return `None` on 404 because "not there" is a normal answer
//! during migration, not a failure.

use serde::Deserialize;
use serde_json::json;

use transfer_gcp_auth::SharedTokenProvider;

use crate::datacatalog::PolicyBinding;
use crate::error::ApiError;
use crate::http::RestClient;

const DATAPLEX_BASE_URL: &str = "https://dataplex.googleapis.com";

/// Wire shape shared by entry group and aspect type reads. Only the transfer
/// status matters to the pipeline: a resource with no status is not a
/// migration twin, whatever its name says.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataplexResource {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub transfer_status: Option<String>,
}

impl DataplexResource {
    /// A candidate counts as confirmed only when the read succeeds and the
    /// resource carries a transfer status.
    pub fn is_confirmed(&self) -> bool {
        self.transfer_status.is_some()
    }
}

#[derive(Debug, Default, Deserialize)]
struct PolicyResponse {
    #[serde(default)]
    bindings: Vec<PolicyBinding>,
}

pub struct DataplexClient {
    rest: RestClient,
    base_url: String,
}

impl DataplexClient {
    pub fn new(tokens: SharedTokenProvider) -> Self {
        Self {
            rest: RestClient::new(tokens),
            base_url: DATAPLEX_BASE_URL.to_string(),
        }
    }

    /// Test seam: point the adapter at a fake Dataplex endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.base_url = base_url;
        self
    }

    async fn get_resource(&self, fqn: &str) -> Result<Option<DataplexResource>, ApiError> {
        let url = format!("{}/v1/{fqn}", self.base_url);
        match self.rest.get_json(&url, &[], "get dataplex resource").await {
            Ok(resource) => Ok(Some(resource)),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn get_entry_group(&self, fqn: &str) -> Result<Option<DataplexResource>, ApiError> {
        self.get_resource(fqn).await
    }

    pub async fn get_aspect_type(&self, fqn: &str) -> Result<Option<DataplexResource>, ApiError> {
        self.get_resource(fqn).await
    }

    /// IAM bindings of a Dataplex resource, addressed by its full name.
    pub async fn get_iam_policy(&self, fqn: &str) -> Result<Vec<PolicyBinding>, ApiError> {
        let url = format!("{}/v1/{fqn}:getIamPolicy", self.base_url);
        let policy: PolicyResponse = self.rest.post_json(&url, &json!({}), "get iam policy").await?;
        Ok(policy.bindings)
    }
}
