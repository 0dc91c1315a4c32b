//! Data Catalog adapter: admin search over the legacy catalog, single-resource
//! reads, the transfer and visibility mutations, forced deletes and IAM policy
//! reads.

use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use transfer_entities::EntryGroup;
use transfer_entities::ResourceKind;
use transfer_entities::TagTemplate;
use transfer_entities::legacy_entry_group_fqn;
use transfer_entities::legacy_tag_template_fqn;
use transfer_entities::parse_entry_group_fqn;
use transfer_entities::parse_tag_template_fqn;
use transfer_gcp_auth::SharedTokenProvider;

use crate::error::ApiError;
use crate::http::RestClient;

const DATA_CATALOG_BASE_URL: &str = "https://datacatalog.googleapis.com";
const SEARCH_PAGE_SIZE: u32 = 500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    #[serde(default)]
    search_result_type: String,
    #[serde(default)]
    relative_resource_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// One page of search hits, already projected into entities.
#[derive(Debug)]
pub struct SearchPage<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

/// Wire shape of an entry group read.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntryGroupResponse {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub transferred_to_dataplex: bool,
}

/// Wire shape of a tag template read.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TagTemplateResponse {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_publicly_readable: bool,
    #[serde(default)]
    pub dataplex_transfer_status: Option<String>,
}

impl TagTemplateResponse {
    pub fn is_transferred(&self) -> bool {
        self.dataplex_transfer_status.as_deref() == Some("TRANSFERRED")
    }
}

#[derive(Debug, Default, Deserialize)]
struct PolicyResponse {
    #[serde(default)]
    bindings: Vec<PolicyBinding>,
}

/// One role/members pair of an IAM policy, as both catalogs return it.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct PolicyBinding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
}

pub struct DataCatalogClient {
    rest: RestClient,
    base_url: String,
}

impl DataCatalogClient {
    pub fn new(tokens: SharedTokenProvider) -> Self {
        Self {
            rest: RestClient::new(tokens),
            base_url: DATA_CATALOG_BASE_URL.to_string(),
        }
    }

    /// Test seam: point the adapter at a fake Data Catalog endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.base_url = base_url;
        self
    }

    async fn search_page(
        &self,
        projects: &[String],
        query: &str,
        page_token: Option<&str>,
    ) -> Result<SearchResponse, ApiError> {
        let url = format!("{}/v1/catalog:search", self.base_url);
        let body = json!({
            "scope": { "includeProjectIds": projects },
            "query": query,
            "adminSearch": true,
            "orderBy": "default",
            "pageSize": SEARCH_PAGE_SIZE,
            "pageToken": page_token,
        });
        self.rest.post_json(&url, &body, "catalog search").await
    }

    fn transferred_clause(transferred: bool) -> &'static str {
        if transferred {
            "transferred=transferred"
        } else {
            "-transferred=transferred"
        }
    }

    /// One page of entry groups matching the transfer filter.
    pub async fn search_entry_groups(
        &self,
        projects: &[String],
        transferred: bool,
        page_token: Option<&str>,
    ) -> Result<SearchPage<EntryGroup>, ApiError> {
        let query = format!("type=entry_group AND {}", Self::transferred_clause(transferred));
        let response = self.search_page(projects, &query, page_token).await?;
        let items = response
            .results
            .iter()
            .map(|result| entry_group_from_result(result, transferred))
            .collect::<Result<Vec<EntryGroup>, ApiError>>()?;
        Ok(SearchPage {
            items,
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    /// One page of tag templates matching the visibility and transfer filters.
    pub async fn search_tag_templates(
        &self,
        projects: &[String],
        public: bool,
        transferred: bool,
        page_token: Option<&str>,
    ) -> Result<SearchPage<TagTemplate>, ApiError> {
        let query = format!(
            "type=tag_template AND {} AND is_public_tag_template={}",
            Self::transferred_clause(transferred),
            public,
        );
        let response = self.search_page(projects, &query, page_token).await?;
        let items = response
            .results
            .iter()
            .map(|result| tag_template_from_result(result, public, transferred))
            .collect::<Result<Vec<TagTemplate>, ApiError>>()?;
        Ok(SearchPage {
            items,
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    pub async fn get_entry_group(
        &self,
        project_id: &str,
        location: &str,
        id: &str,
    ) -> Result<EntryGroupResponse, ApiError> {
        let fqn = legacy_entry_group_fqn(project_id, location, id);
        let url = format!("{}/v1/{fqn}", self.base_url);
        self.rest.get_json(&url, &[], "get entry group").await
    }

    pub async fn get_tag_template(
        &self,
        project_id: &str,
        location: &str,
        id: &str,
    ) -> Result<TagTemplateResponse, ApiError> {
        let fqn = legacy_tag_template_fqn(project_id, location, id);
        let url = format!("{}/v1/{fqn}", self.base_url);
        self.rest.get_json(&url, &[], "get tag template").await
    }

    /// Marks an entry group as transferred to Dataplex. The server moves the
    /// data; this mutation only flips the managing system.
    pub async fn transfer_entry_group(&self, fqn: &str) -> Result<(), ApiError> {
        let url = format!("{}/v1/{fqn}", self.base_url);
        let _: Value = self
            .rest
            .patch_json(
                &url,
                &[("updateMask", "transferredToDataplex")],
                &json!({ "transferredToDataplex": true }),
                "transfer entry group",
            )
            .await?;
        Ok(())
    }

    /// Marks a tag template as transferred to Dataplex.
    pub async fn transfer_tag_template(&self, fqn: &str) -> Result<(), ApiError> {
        let url = format!("{}/v1/{fqn}", self.base_url);
        let _: Value = self
            .rest
            .patch_json(
                &url,
                &[("updateMask", "dataplexTransferStatus")],
                &json!({ "dataplexTransferStatus": "TRANSFERRED" }),
                "transfer tag template",
            )
            .await?;
        Ok(())
    }

    /// Flips a private tag template to publicly readable.
    pub async fn convert_private_tag_template(
        &self,
        fqn: &str,
    ) -> Result<TagTemplateResponse, ApiError> {
        let url = format!("{}/v1/{fqn}", self.base_url);
        self.rest
            .patch_json(
                &url,
                &[("updateMask", "isPubliclyReadable")],
                &json!({ "isPubliclyReadable": true }),
                "convert tag template",
            )
            .await
    }

    pub async fn delete_entry_group(
        &self,
        project_id: &str,
        location: &str,
        id: &str,
        force: bool,
    ) -> Result<(), ApiError> {
        let fqn = legacy_entry_group_fqn(project_id, location, id);
        let url = format!("{}/v1/{fqn}", self.base_url);
        self.rest
            .delete(&url, &[("force", if force { "true" } else { "false" })], "delete entry group")
            .await
    }

    pub async fn delete_tag_template(
        &self,
        project_id: &str,
        location: &str,
        id: &str,
        force: bool,
    ) -> Result<(), ApiError> {
        let fqn = legacy_tag_template_fqn(project_id, location, id);
        let url = format!("{}/v1/{fqn}", self.base_url);
        self.rest
            .delete(&url, &[("force", if force { "true" } else { "false" })], "delete tag template")
            .await
    }

    /// IAM bindings of a legacy resource. An empty policy is a valid answer.
    pub async fn get_iam_policy(
        &self,
        kind: ResourceKind,
        project_id: &str,
        location: &str,
        id: &str,
    ) -> Result<Vec<PolicyBinding>, ApiError> {
        let fqn = match kind {
            ResourceKind::EntryGroup => legacy_entry_group_fqn(project_id, location, id),
            ResourceKind::TagTemplate => legacy_tag_template_fqn(project_id, location, id),
        };
        let url = format!("{}/v1/{fqn}:getIamPolicy", self.base_url);
        let policy: PolicyResponse = self.rest.post_json(&url, &json!({}), "get iam policy").await?;
        Ok(policy.bindings)
    }
}

fn entry_group_from_result(
    result: &SearchResult,
    transferred: bool,
) -> Result<EntryGroup, ApiError> {
    if result.search_result_type != "ENTRY_GROUP" {
        return Err(ApiError::Type(format!(
            "expected ENTRY_GROUP, got {}",
            result.search_result_type
        )));
    }
    let parts = parse_entry_group_fqn(&result.relative_resource_name)?;
    Ok(EntryGroup::new(&parts.project_id, &parts.location, &parts.id, transferred))
}

fn tag_template_from_result(
    result: &SearchResult,
    public: bool,
    transferred: bool,
) -> Result<TagTemplate, ApiError> {
    if result.search_result_type != "TAG_TEMPLATE" {
        return Err(ApiError::Type(format!(
            "expected TAG_TEMPLATE, got {}",
            result.search_result_type
        )));
    }
    let parts = parse_tag_template_fqn(&result.relative_resource_name)?;
    Ok(TagTemplate::new(&parts.project_id, &parts.location, &parts.id, public, transferred))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn result(kind: &str, name: &str) -> SearchResult {
        SearchResult {
            search_result_type: kind.to_string(),
            relative_resource_name: name.to_string(),
        }
    }

    #[test]
    fn projection_checks_result_type() {
        let hit = result("TAG_TEMPLATE", "projects/prj1/locations/eu/tagTemplates/tt1");
        let tt = tag_template_from_result(&hit, true, false).unwrap();
        assert_eq!(tt.id, "tt1");
        assert!(tt.public);

        let wrong = entry_group_from_result(&hit, false).unwrap_err();
        assert!(matches!(wrong, ApiError::Type(_)));
    }

    #[test]
    fn projection_rejects_malformed_names() {
        let hit = result("ENTRY_GROUP", "projects/prj1/entryGroups/eg1");
        assert!(matches!(
            entry_group_from_result(&hit, false).unwrap_err(),
            ApiError::Format(_)
        ));
    }

    #[test]
    fn transfer_status_gate() {
        let tt = TagTemplateResponse {
            name: "n".to_string(),
            is_publicly_readable: false,
            dataplex_transfer_status: Some("TRANSFERRED".to_string()),
        };
        assert!(tt.is_transferred());
        let tt = TagTemplateResponse {
            dataplex_transfer_status: Some("MIGRATED".to_string()),
            ..tt
        };
        assert!(!tt.is_transferred());
    }
}
