//! Cloud Asset adapter. Project discovery searches the organization's asset
//! inventory for enabled `serviceusage` services instead of listing every
//! project: only projects that ever enabled one of the two catalog APIs can
//! hold resources worth migrating.

use serde::Deserialize;

use transfer_entities::Project;
use transfer_gcp_auth::SharedTokenProvider;

use crate::error::ApiError;
use crate::http::RestClient;

const CLOUD_ASSET_BASE_URL: &str = "https://cloudasset.googleapis.com";
const SERVICE_ASSET_TYPE: &str = "serviceusage.googleapis.com/Service";
const SERVICE_QUERY: &str = "name:(datacatalog.googleapis.com OR dataplex.googleapis.com)";

pub const DATA_CATALOG_API: &str = "datacatalog.googleapis.com";
pub const DATAPLEX_API: &str = "dataplex.googleapis.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetSearchResult {
    #[serde(default)]
    display_name: String,
    /// `projects/{projectNumber}` of the owning project.
    #[serde(default)]
    project: String,
    /// Full resource name of the parent, ending in `projects/{projectId}`.
    #[serde(default)]
    parent_full_resource_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetSearchResponse {
    #[serde(default)]
    results: Vec<AssetSearchResult>,
    #[serde(default)]
    next_page_token: Option<String>,
}

pub struct CloudAssetClient {
    rest: RestClient,
    base_url: String,
    organization: String,
}

impl CloudAssetClient {
    pub fn new(organization_number: &str, tokens: SharedTokenProvider) -> Self {
        Self {
            rest: RestClient::new(tokens),
            base_url: CLOUD_ASSET_BASE_URL.to_string(),
            organization: format!("organizations/{organization_number}"),
        }
    }

    /// Test seam: point the adapter at a fake Cloud Asset endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.base_url = base_url;
        self
    }

    /// Every project in the organization with the Data Catalog or Dataplex
    /// API enabled. One record per enabled service; callers merge duplicates.
    pub async fn fetch_projects(&self) -> Result<Vec<Project>, ApiError> {
        let url = format!("{}/v1/{}:searchAllResources", self.base_url, self.organization);
        let mut projects = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("assetTypes", SERVICE_ASSET_TYPE),
                ("query", SERVICE_QUERY),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let response: AssetSearchResponse = match self
                .rest
                .get_json(&url, &query, "search all resources")
                .await
            {
                Err(ApiError::PermissionDenied(_)) => {
                    return Err(ApiError::PermissionDenied(format!(
                        "not enough permissions for scope {} or scope does not exist",
                        self.organization
                    )));
                }
                other => other?,
            };

            for result in &response.results {
                projects.push(project_from_result(result)?);
            }

            page_token = response.next_page_token.filter(|t| !t.is_empty());
            if page_token.is_none() {
                break;
            }
        }
        Ok(projects)
    }
}

/// Extracts the trailing `projects/{x}` segment pair.
fn trailing_project(name: &str) -> Option<&str> {
    let (prefix, id) = name.rsplit_once('/')?;
    if !prefix.ends_with("projects") || id.is_empty() {
        return None;
    }
    Some(id)
}

fn project_from_result(result: &AssetSearchResult) -> Result<Project, ApiError> {
    let project_id = trailing_project(&result.parent_full_resource_name).ok_or_else(|| {
        ApiError::Format(format!(
            "incorrect parent name: {}",
            result.parent_full_resource_name
        ))
    })?;
    let project_number = trailing_project(&result.project)
        .and_then(|n| n.parse::<i64>().ok())
        .ok_or_else(|| ApiError::Format(format!("incorrect project name: {}", result.project)))?;

    let mut project = Project::new(project_id, project_number);
    if result.display_name == DATA_CATALOG_API {
        project.data_catalog_api_enabled = true;
    }
    if result.display_name == DATAPLEX_API {
        project.dataplex_api_enabled = true;
    }
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn result(display_name: &str, number: &str, parent: &str) -> AssetSearchResult {
        AssetSearchResult {
            display_name: display_name.to_string(),
            project: format!("projects/{number}"),
            parent_full_resource_name: parent.to_string(),
        }
    }

    #[test]
    fn projects_carry_the_service_flag_that_found_them() {
        let hit = result(
            DATA_CATALOG_API,
            "123",
            "//cloudresourcemanager.googleapis.com/projects/prj1",
        );
        let project = project_from_result(&hit).unwrap();
        assert_eq!(project.project_id, "prj1");
        assert_eq!(project.project_number, 123);
        assert!(project.data_catalog_api_enabled);
        assert!(!project.dataplex_api_enabled);
    }

    #[test]
    fn malformed_parents_are_format_faults() {
        let hit = result(DATAPLEX_API, "123", "//cloudresourcemanager.googleapis.com/folders/9");
        assert!(matches!(project_from_result(&hit).unwrap_err(), ApiError::Format(_)));

        let hit = AssetSearchResult {
            display_name: DATAPLEX_API.to_string(),
            project: "projects/not-a-number".to_string(),
            parent_full_resource_name: "//cloudresourcemanager.googleapis.com/projects/prj1"
                .to_string(),
        };
        assert!(matches!(project_from_result(&hit).unwrap_err(), ApiError::Format(_)));
    }
}
