//! Row shapes, one per table, in the column naming BigQuery sees. Each row
//! is produced in exactly one stage and never mutated afterwards; snapshot
//! rows carry the `createdAt` date the producing controller chose.

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

use transfer_entities::Ancestor;
use transfer_entities::EntryGroup;
use transfer_entities::ManagingSystem;
use transfer_entities::Project;
use transfer_entities::TagTemplate;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRow {
    pub project_id: String,
    pub project_number: i64,
    pub is_data_catalog_api_enabled: bool,
    pub is_dataplex_api_enabled: bool,
    pub ancestry: Vec<Ancestor>,
    pub created_at: NaiveDate,
}

impl ProjectRow {
    pub fn from_project(project: &Project, created_at: NaiveDate) -> Self {
        Self {
            project_id: project.project_id.clone(),
            project_number: project.project_number,
            is_data_catalog_api_enabled: project.data_catalog_api_enabled,
            is_dataplex_api_enabled: project.dataplex_api_enabled,
            ancestry: project.ancestry.clone(),
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryGroupRow {
    pub resource_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataplex_resource_name: Option<String>,
    pub project_id: String,
    pub location: String,
    pub entry_group_id: String,
    pub managing_system: ManagingSystem,
    pub created_at: NaiveDate,
}

impl EntryGroupRow {
    pub fn from_entry_group(entity: &EntryGroup, created_at: NaiveDate) -> Self {
        Self {
            resource_name: entity.resource_name.clone(),
            dataplex_resource_name: entity.dataplex_resource_name.clone(),
            project_id: entity.project_id.clone(),
            location: entity.location.clone(),
            entry_group_id: entity.id.clone(),
            managing_system: entity.managing_system,
            created_at,
        }
    }

    pub fn into_entity(self) -> EntryGroup {
        EntryGroup {
            resource_name: self.resource_name,
            dataplex_resource_name: self.dataplex_resource_name,
            project_id: self.project_id,
            location: self.location,
            id: self.entry_group_id,
            managing_system: self.managing_system,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagTemplateRow {
    pub resource_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataplex_resource_name: Option<String>,
    pub project_id: String,
    pub location: String,
    pub tag_template_id: String,
    pub managing_system: ManagingSystem,
    /// Nullable in the view output when the snapshot predates the column.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_publicly_readable: bool,
    pub created_at: NaiveDate,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl TagTemplateRow {
    pub fn from_tag_template(entity: &TagTemplate, created_at: NaiveDate) -> Self {
        Self {
            resource_name: entity.resource_name.clone(),
            dataplex_resource_name: entity.dataplex_resource_name.clone(),
            project_id: entity.project_id.clone(),
            location: entity.location.clone(),
            tag_template_id: entity.id.clone(),
            managing_system: entity.managing_system,
            is_publicly_readable: entity.public,
            created_at,
        }
    }

    pub fn into_entity(self) -> TagTemplate {
        TagTemplate {
            resource_name: self.resource_name,
            dataplex_resource_name: self.dataplex_resource_name,
            project_id: self.project_id,
            location: self.location,
            id: self.tag_template_id,
            public: self.is_publicly_readable,
            managing_system: self.managing_system,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRow {
    pub data_catalog_resource_name: String,
    pub dataplex_resource_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamBinding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IamPolicyRow {
    pub resource_name: String,
    pub system: ManagingSystem,
    #[serde(default)]
    pub bindings: Vec<IamBinding>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn entry_group_row_round_trips_through_entity() {
        let entity = EntryGroup::new("prj1", "us-west1", "eg1", true);
        let row = EntryGroupRow::from_entry_group(&entity, date());
        assert_eq!(row.managing_system, ManagingSystem::Dataplex);
        assert_eq!(row.entry_group_id, "eg1");
        assert_eq!(row.into_entity(), entity);
    }

    #[test]
    fn tag_template_row_serializes_bigquery_columns() {
        let entity = TagTemplate::new("prj1", "eu", "tt1", false, false);
        let row = TagTemplateRow::from_tag_template(&entity, date());
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["resourceName"], "projects/prj1/locations/eu/tagTemplates/tt1");
        assert_eq!(json["tagTemplateId"], "tt1");
        assert_eq!(json["isPubliclyReadable"], false);
        assert_eq!(json["managingSystem"], "DATA_CATALOG");
        assert_eq!(json["createdAt"], "2025-03-01");
        assert!(json.get("dataplexResourceName").is_none());
    }

    #[test]
    fn project_row_keeps_ancestry_order() {
        use transfer_entities::AncestryKind;

        let mut project = Project::new("prj1", 123);
        project.ancestry = vec![
            Ancestor {
                kind: AncestryKind::Folder,
                id: "77".to_string(),
            },
            Ancestor {
                kind: AncestryKind::Organization,
                id: "1".to_string(),
            },
        ];
        let row = ProjectRow::from_project(&project, date());
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["ancestry"][0]["type"], "FOLDER");
        assert_eq!(json["ancestry"][1]["type"], "ORGANIZATION");
        assert_eq!(json["projectNumber"], 123);
    }
}
