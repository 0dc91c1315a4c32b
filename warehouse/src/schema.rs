//! Declarative table schemas. Each table the pipeline writes is described
//! here once; `ensure_table` turns the description into a BigQuery table
//! definition. Snapshot tables are day-partitioned on `createdAt` and force
//! a partition filter on every read.

use serde_json::Value;
use serde_json::json;

pub const PARTITION_COLUMN: &str = "createdAt";

/// Tables owned by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableName {
    Projects,
    EntryGroups,
    TagTemplates,
    EntryGroupsResourceMapping,
    TagTemplatesResourceMapping,
    IamPolicies,
}

impl TableName {
    pub fn as_str(self) -> &'static str {
        match self {
            TableName::Projects => "projects",
            TableName::EntryGroups => "entry_groups_table",
            TableName::TagTemplates => "tag_templates_table",
            TableName::EntryGroupsResourceMapping => "entry_groups_resource_mapping",
            TableName::TagTemplatesResourceMapping => "tag_templates_resource_mapping",
            TableName::IamPolicies => "iam_policies",
        }
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What `ensure_table` needs to know about a table.
pub struct TableMetadata {
    /// BigQuery schema, in the REST representation.
    pub fields: Value,
    pub partitioned: bool,
    pub partition_column: &'static str,
    pub require_partition_filter: bool,
}

pub fn table_metadata(table: TableName) -> TableMetadata {
    match table {
        TableName::Projects => TableMetadata {
            fields: json!([
                { "name": "projectId", "type": "STRING", "mode": "REQUIRED" },
                { "name": "projectNumber", "type": "INTEGER", "mode": "REQUIRED" },
                { "name": "isDataCatalogApiEnabled", "type": "BOOLEAN", "mode": "REQUIRED" },
                { "name": "isDataplexApiEnabled", "type": "BOOLEAN", "mode": "REQUIRED" },
                {
                    "name": "ancestry",
                    "type": "RECORD",
                    "mode": "REPEATED",
                    "fields": [
                        { "name": "type", "type": "STRING", "mode": "REQUIRED" },
                        { "name": "id", "type": "STRING", "mode": "REQUIRED" },
                    ],
                },
                { "name": "createdAt", "type": "DATE", "mode": "REQUIRED" },
            ]),
            partitioned: true,
            partition_column: PARTITION_COLUMN,
            require_partition_filter: true,
        },
        TableName::EntryGroups => TableMetadata {
            fields: json!([
                {
                    "name": "resourceName",
                    "type": "STRING",
                    "mode": "REQUIRED",
                    "description": "Format: projects/:project/locations/:location/entryGroups/:entryGroupId",
                },
                {
                    "name": "dataplexResourceName",
                    "type": "STRING",
                    "description": "Format: projects/:project/locations/:location/entryGroups/:entryGroupId",
                },
                { "name": "projectId", "type": "STRING", "mode": "REQUIRED" },
                { "name": "location", "type": "STRING", "mode": "REQUIRED" },
                { "name": "entryGroupId", "type": "STRING", "mode": "REQUIRED" },
                {
                    "name": "managingSystem",
                    "type": "STRING",
                    "mode": "REQUIRED",
                    "description": "Either DATA_CATALOG or DATAPLEX",
                },
                { "name": "createdAt", "type": "DATE", "mode": "REQUIRED" },
            ]),
            partitioned: true,
            partition_column: PARTITION_COLUMN,
            require_partition_filter: true,
        },
        TableName::TagTemplates => TableMetadata {
            fields: json!([
                {
                    "name": "resourceName",
                    "type": "STRING",
                    "mode": "REQUIRED",
                    "description": "Format: projects/:project/locations/:location/tagTemplates/:tagTemplateId",
                },
                {
                    "name": "dataplexResourceName",
                    "type": "STRING",
                    "description": "Format: projects/:project/locations/global/aspectTypes/:aspectTypeId",
                },
                { "name": "projectId", "type": "STRING", "mode": "REQUIRED" },
                { "name": "location", "type": "STRING", "mode": "REQUIRED" },
                { "name": "tagTemplateId", "type": "STRING", "mode": "REQUIRED" },
                {
                    "name": "managingSystem",
                    "type": "STRING",
                    "mode": "REQUIRED",
                    "description": "Either DATA_CATALOG or DATAPLEX",
                },
                { "name": "isPubliclyReadable", "type": "BOOLEAN" },
                { "name": "createdAt", "type": "DATE", "mode": "REQUIRED" },
            ]),
            partitioned: true,
            partition_column: PARTITION_COLUMN,
            require_partition_filter: true,
        },
        TableName::EntryGroupsResourceMapping => TableMetadata {
            fields: json!([
                {
                    "name": "dataCatalogResourceName",
                    "type": "STRING",
                    "mode": "REQUIRED",
                    "description": "Format: projects/:project/locations/:location/entryGroups/:entryGroupId",
                },
                {
                    "name": "dataplexResourceName",
                    "type": "STRING",
                    "mode": "REQUIRED",
                    "description": "Format: projects/:project/locations/:location/entryGroups/:entryGroupId",
                },
            ]),
            partitioned: false,
            partition_column: PARTITION_COLUMN,
            require_partition_filter: false,
        },
        TableName::TagTemplatesResourceMapping => TableMetadata {
            fields: json!([
                {
                    "name": "dataCatalogResourceName",
                    "type": "STRING",
                    "mode": "REQUIRED",
                    "description": "Format: projects/:project/locations/:location/tagTemplates/:tagTemplateId",
                },
                {
                    "name": "dataplexResourceName",
                    "type": "STRING",
                    "mode": "REQUIRED",
                    "description": "Format: projects/:project/locations/global/aspectTypes/:aspectTypeId",
                },
            ]),
            partitioned: false,
            partition_column: PARTITION_COLUMN,
            require_partition_filter: false,
        },
        TableName::IamPolicies => TableMetadata {
            fields: json!([
                { "name": "resourceName", "type": "STRING", "mode": "REQUIRED" },
                {
                    "name": "system",
                    "type": "STRING",
                    "mode": "REQUIRED",
                    "description": "Either DATA_CATALOG or DATAPLEX",
                },
                {
                    "name": "bindings",
                    "type": "RECORD",
                    "mode": "REPEATED",
                    "fields": [
                        { "name": "role", "type": "STRING", "mode": "REQUIRED" },
                        { "name": "members", "type": "STRING", "mode": "REPEATED" },
                    ],
                },
            ]),
            partitioned: false,
            partition_column: PARTITION_COLUMN,
            require_partition_filter: false,
        },
    }
}
