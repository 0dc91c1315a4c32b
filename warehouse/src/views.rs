//! View definitions. The join views glue each snapshot table to its mapping
//! table so downstream stages see the Dataplex name next to the Data Catalog
//! one; the analytical views are reporting surfaces over IAM policies and
//! exported audit logs.

use crate::schema::TableName;

/// Name of the table audit-log export writes into (created by the log sink,
/// not by this tooling).
pub const AUDIT_LOG_TABLE: &str = "cloudaudit_googleapis_com_data_access";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewName {
    EntryGroups,
    TagTemplates,
    ResourceInteractions,
    ResourceInteractionsSummary,
    IamPoliciesComparison,
}

impl ViewName {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewName::EntryGroups => "entry_groups",
            ViewName::TagTemplates => "tag_templates",
            ViewName::ResourceInteractions => "resource_interactions",
            ViewName::ResourceInteractionsSummary => "resource_interactions_summary",
            ViewName::IamPoliciesComparison => "iam_policies_comparison",
        }
    }
}

impl std::fmt::Display for ViewName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders the `SELECT` body for a view, fully qualified against
/// `project.dataset`.
pub fn view_sql(view: ViewName, project: &str, dataset: &str) -> String {
    let qualified = |name: &str| format!("`{project}.{dataset}.{name}`");

    match view {
        ViewName::EntryGroups => format!(
            "SELECT\n    \
                eg.resourceName,\n    \
                egrm.dataplexResourceName,\n    \
                eg.projectId,\n    \
                eg.location,\n    \
                eg.entryGroupId,\n    \
                eg.managingSystem,\n    \
                eg.createdAt\n\
            FROM {entity} AS eg\n\
            LEFT JOIN {mapping} AS egrm\n\
            ON eg.resourceName = egrm.dataCatalogResourceName",
            entity = qualified(TableName::EntryGroups.as_str()),
            mapping = qualified(TableName::EntryGroupsResourceMapping.as_str()),
        ),
        ViewName::TagTemplates => format!(
            "SELECT\n    \
                tt.resourceName,\n    \
                ttrm.dataplexResourceName,\n    \
                tt.projectId,\n    \
                tt.location,\n    \
                tt.tagTemplateId,\n    \
                tt.managingSystem,\n    \
                tt.isPubliclyReadable,\n    \
                tt.createdAt\n\
            FROM {entity} AS tt\n\
            LEFT JOIN {mapping} AS ttrm\n\
            ON tt.resourceName = ttrm.dataCatalogResourceName",
            entity = qualified(TableName::TagTemplates.as_str()),
            mapping = qualified(TableName::TagTemplatesResourceMapping.as_str()),
        ),
        ViewName::ResourceInteractions => format!(
            "SELECT\n    \
                protopayload_auditlog.resourceName AS resourceName,\n    \
                protopayload_auditlog.authenticationInfo.principalEmail AS principalEmail,\n    \
                protopayload_auditlog.methodName AS methodName,\n    \
                protopayload_auditlog.serviceName AS serviceName,\n    \
                timestamp AS interactionAt\n\
            FROM {audit}\n\
            WHERE protopayload_auditlog.serviceName IN\n    \
                ('datacatalog.googleapis.com', 'dataplex.googleapis.com')",
            audit = qualified(AUDIT_LOG_TABLE),
        ),
        ViewName::ResourceInteractionsSummary => format!(
            "SELECT\n    \
                resourceName,\n    \
                principalEmail,\n    \
                serviceName,\n    \
                COUNT(*) AS interactionCount,\n    \
                MAX(interactionAt) AS lastInteractionAt\n\
            FROM {interactions}\n\
            GROUP BY resourceName, principalEmail, serviceName",
            interactions = qualified(ViewName::ResourceInteractions.as_str()),
        ),
        ViewName::IamPoliciesComparison => format!(
            "SELECT\n    \
                legacy.resourceName AS dataCatalogResourceName,\n    \
                modern.resourceName AS dataplexResourceName,\n    \
                legacy_binding.role AS dataCatalogRole,\n    \
                modern_binding.role AS dataplexRole,\n    \
                legacy_member AS dataCatalogMember,\n    \
                modern_member AS dataplexMember\n\
            FROM {policies} AS legacy\n\
            LEFT JOIN UNNEST(legacy.bindings) AS legacy_binding\n\
            LEFT JOIN UNNEST(legacy_binding.members) AS legacy_member\n\
            FULL OUTER JOIN {policies} AS modern\n\
            LEFT JOIN UNNEST(modern.bindings) AS modern_binding\n\
            LEFT JOIN UNNEST(modern_binding.members) AS modern_member\n\
            ON legacy.resourceName = modern.resourceName\n\
            WHERE legacy.system = 'DATA_CATALOG' AND modern.system = 'DATAPLEX'",
            policies = qualified(TableName::IamPolicies.as_str()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn join_views_reference_their_tables() {
        let sql = view_sql(ViewName::EntryGroups, "prj1", "transfer_tooling");
        assert!(sql.contains("`prj1.transfer_tooling.entry_groups_table`"));
        assert!(sql.contains("`prj1.transfer_tooling.entry_groups_resource_mapping`"));
        assert!(sql.contains("LEFT JOIN"));

        let sql = view_sql(ViewName::TagTemplates, "prj1", "transfer_tooling");
        assert!(sql.contains("tt.isPubliclyReadable"));
        assert!(sql.contains("`prj1.transfer_tooling.tag_templates_resource_mapping`"));
    }

    #[test]
    fn analytics_views_cover_both_sources() {
        let sql = view_sql(ViewName::ResourceInteractions, "prj1", "ds");
        assert!(sql.contains(AUDIT_LOG_TABLE));

        let sql = view_sql(ViewName::ResourceInteractionsSummary, "prj1", "ds");
        assert!(sql.contains("`prj1.ds.resource_interactions`"));

        let sql = view_sql(ViewName::IamPoliciesComparison, "prj1", "ds");
        assert!(sql.contains("`prj1.ds.iam_policies`"));
    }

    #[test]
    fn view_names_are_stable() {
        assert_eq!(ViewName::EntryGroups.as_str(), "entry_groups");
        assert_eq!(ViewName::TagTemplates.as_str(), "tag_templates");
        assert_eq!(ViewName::IamPoliciesComparison.as_str(), "iam_policies_comparison");
    }
}
