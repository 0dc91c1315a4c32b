//! Resource Manager adapter: project numbers (memoised, they are stable) and
//! ancestry chains.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use transfer_entities::Ancestor;
use transfer_entities::AncestryKind;
use transfer_gcp_auth::SharedTokenProvider;

use crate::error::ApiError;
use crate::http::RestClient;

const RESOURCE_MANAGER_BASE_URL: &str = "https://cloudresourcemanager.googleapis.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    project_number: String,
}

#[derive(Debug, Deserialize)]
struct AncestryResponse {
    #[serde(default)]
    ancestor: Vec<AncestryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AncestryEntry {
    resource_id: AncestryResourceId,
}

#[derive(Debug, Deserialize)]
struct AncestryResourceId {
    #[serde(rename = "type")]
    kind: String,
    id: String,
}

pub struct ResourceManagerClient {
    rest: RestClient,
    base_url: String,
    project_numbers: Mutex<HashMap<String, i64>>,
}

impl ResourceManagerClient {
    pub fn new(tokens: SharedTokenProvider) -> Self {
        Self {
            rest: RestClient::new(tokens),
            base_url: RESOURCE_MANAGER_BASE_URL.to_string(),
            project_numbers: Mutex::new(HashMap::new()),
        }
    }

    /// Test seam: point the adapter at a fake Resource Manager endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.base_url = base_url;
        self
    }

    /// The numeric id of a project, cached per project id.
    pub async fn project_number(&self, project_id: &str) -> Result<i64, ApiError> {
        if let Some(number) = self.project_numbers.lock().await.get(project_id) {
            return Ok(*number);
        }

        let url = format!("{}/v1/projects/{project_id}", self.base_url);
        let project: ProjectResponse = self.rest.get_json(&url, &[], "get project").await?;
        let number = project
            .project_number
            .parse::<i64>()
            .map_err(|_| ApiError::Decode {
                url,
                message: format!("project number is not numeric: {}", project.project_number),
            })?;

        self.project_numbers
            .lock()
            .await
            .insert(project_id.to_string(), number);
        Ok(number)
    }

    /// Ancestry of a project, leaf to root, the project itself excluded.
    /// An ancestor that is neither folder nor organization is a format fault.
    pub async fn project_ancestry(&self, project_id: &str) -> Result<Vec<Ancestor>, ApiError> {
        let url = format!("{}/v1/projects/{project_id}:getAncestry", self.base_url);
        let response: AncestryResponse = match self
            .rest
            .post_json(&url, &json!({}), "get ancestry")
            .await
        {
            Err(ApiError::PermissionDenied(_)) => {
                return Err(ApiError::PermissionDenied(format!(
                    "not enough permissions for project {project_id} or project does not exist"
                )));
            }
            Err(ApiError::InvalidArgument(_)) => {
                return Err(ApiError::InvalidArgument(format!(
                    "incorrect project name: {project_id}"
                )));
            }
            other => other?,
        };

        let mut ancestry = Vec::new();
        for entry in response.ancestor {
            let kind = match entry.resource_id.kind.as_str() {
                "folder" => AncestryKind::Folder,
                "organization" => AncestryKind::Organization,
                "project" => continue,
                other => {
                    return Err(ApiError::Format(format!(
                        "the parent is neither a folder, an organization, nor a project: {other}"
                    )));
                }
            };
            ancestry.push(Ancestor {
                kind,
                id: entry.resource_id.id,
            });
        }
        Ok(ancestry)
    }

    /// The organization number above `project_id`, if any.
    pub async fn organization_number(&self, project_id: &str) -> Result<Option<String>, ApiError> {
        let ancestry = self.project_ancestry(project_id).await?;
        Ok(ancestry
            .into_iter()
            .find(|a| a.kind == AncestryKind::Organization)
            .map(|a| a.id))
    }
}
