//! Task payloads. Controllers serialize these into Cloud Tasks bodies;
//! handlers deserialize and validate them on receipt. Every stage that needs
//! snapshot alignment carries a `created_at` date so re-deliveries keep
//! writing into the partition the controller picked.

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

use crate::error::EntityError;
use crate::resource::ManagingSystem;
use crate::resource::ResourceKind;

/// Resource type literal used by the enumeration stage (matches the Data
/// Catalog search `type=` filter values).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchResourceType {
    EntryGroup,
    TagTemplate,
}

impl SearchResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchResourceType::EntryGroup => "entry_group",
            SearchResourceType::TagTemplate => "tag_template",
        }
    }
}

/// Input of the project-discovery handler: one discovered project, ancestry
/// still unresolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchProjectsTask {
    pub project_id: String,
    pub project_number: i64,
    #[serde(default)]
    pub data_catalog_api_enabled: bool,
    #[serde(default)]
    pub dataplex_api_enabled: bool,
    pub created_at: NaiveDate,
}

/// Input of the enumeration handler: one search page to fetch. A successor
/// task differs from its predecessor only by `next_page_token`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResourcesTask {
    /// Project id the search is scoped to.
    pub scope: String,
    pub resource_type: SearchResourceType,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub is_transferred: bool,
    pub created_at: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl FetchResourcesTask {
    /// `is_public` splits the tag template search; it has no meaning for
    /// entry groups and must be present for tag templates.
    pub fn validate(&self) -> Result<(), EntityError> {
        if self.resource_type == SearchResourceType::TagTemplate && self.is_public.is_none() {
            return Err(EntityError::Validation(
                "`is_public` is required when `resource_type` is `tag_template`".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_next_page_token(&self, token: String) -> Self {
        Self {
            next_page_token: Some(token),
            ..self.clone()
        }
    }
}

/// Identity of one resource inside a task body. `resource_name` is the short
/// id; the full name is reassembled from the triple on the handler side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub project_id: String,
    pub location: String,
    pub resource_name: String,
}

/// [`ResourceRef`] plus the system that currently owns the resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyResourceRef {
    pub project_id: String,
    pub location: String,
    pub resource_name: String,
    pub system: ManagingSystem,
}

/// Input of the mapping, transfer and cleanup handlers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTask {
    pub resource_type: ResourceKind,
    pub resource: ResourceRef,
}

/// Input of the policy-fetch handler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchPoliciesTask {
    pub resource_type: ResourceKind,
    pub created_at: NaiveDate,
    pub resource: PolicyResourceRef,
}

/// Input of the visibility-conversion handler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertTagTemplateTask {
    pub project_id: String,
    pub location: String,
    pub resource_name: String,
}
