use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

/// Ancestor kinds a project can have on its way up to the organization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AncestryKind {
    Organization,
    Folder,
}

/// One step of a project's ancestry chain, ordered leaf to root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ancestor {
    #[serde(rename = "type")]
    pub kind: AncestryKind,
    pub id: String,
}

/// A project owned by the organization, as assembled from asset search
/// results and Resource Manager lookups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    pub project_id: String,
    pub project_number: i64,
    pub data_catalog_api_enabled: bool,
    pub dataplex_api_enabled: bool,
    pub ancestry: Vec<Ancestor>,
}

impl Project {
    pub fn new(project_id: &str, project_number: i64) -> Self {
        Self {
            project_id: project_id.to_string(),
            project_number,
            data_catalog_api_enabled: false,
            dataplex_api_enabled: false,
            ancestry: Vec::new(),
        }
    }

    /// The organization number from the ancestry chain, if resolved.
    pub fn organization_number(&self) -> Option<&str> {
        self.ancestry
            .iter()
            .find(|a| a.kind == AncestryKind::Organization)
            .map(|a| a.id.as_str())
    }
}

/// Deduplicates discovery results by project id. The search yields one hit
/// per enabled service, so the same project can appear twice; the merged
/// record ORs the two API flags.
pub fn merge_projects(projects: Vec<Project>) -> Vec<Project> {
    let mut by_id: HashMap<String, Project> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for project in projects {
        match by_id.get_mut(&project.project_id) {
            Some(existing) => {
                existing.data_catalog_api_enabled |= project.data_catalog_api_enabled;
                existing.dataplex_api_enabled |= project.dataplex_api_enabled;
            }
            None => {
                order.push(project.project_id.clone());
                by_id.insert(project.project_id.clone(), project);
            }
        }
    }

    order.into_iter().filter_map(|id| by_id.remove(&id)).collect()
}
