use serde::Deserialize;
use serde::Serialize;

use crate::names::dataplex_aspect_type_fqn;
use crate::names::dataplex_entry_group_fqn;
use crate::names::legacy_entry_group_fqn;
use crate::names::legacy_tag_template_fqn;

/// Which catalog is currently authoritative for a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManagingSystem {
    DataCatalog,
    Dataplex,
}

impl ManagingSystem {
    pub fn from_transferred(transferred: bool) -> Self {
        if transferred {
            ManagingSystem::Dataplex
        } else {
            ManagingSystem::DataCatalog
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ManagingSystem::DataCatalog => "DATA_CATALOG",
            ManagingSystem::Dataplex => "DATAPLEX",
        }
    }
}

impl std::fmt::Display for ManagingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two resource kinds moved by the pipeline. Task payloads carry this
/// tag explicitly so handlers dispatch on it instead of probing the shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    EntryGroup,
    TagTemplate,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::EntryGroup => "EntryGroup",
            ResourceKind::TagTemplate => "TagTemplate",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry group discovered in Data Catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryGroup {
    pub project_id: String,
    pub location: String,
    pub id: String,
    pub resource_name: String,
    pub dataplex_resource_name: Option<String>,
    pub managing_system: ManagingSystem,
}

impl EntryGroup {
    pub fn new(project_id: &str, location: &str, id: &str, transferred: bool) -> Self {
        Self {
            resource_name: legacy_entry_group_fqn(project_id, location, id),
            project_id: project_id.to_string(),
            location: location.to_string(),
            id: id.to_string(),
            dataplex_resource_name: None,
            managing_system: ManagingSystem::from_transferred(transferred),
        }
    }

    /// The name this entry group has (or would have) on the Dataplex side.
    pub fn dataplex_fqn(&self) -> String {
        dataplex_entry_group_fqn(&self.project_id, &self.location, &self.id)
    }
}

/// A tag template discovered in Data Catalog. `public` mirrors the
/// `isPubliclyReadable` flag on the upstream resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagTemplate {
    pub project_id: String,
    pub location: String,
    pub id: String,
    pub resource_name: String,
    pub dataplex_resource_name: Option<String>,
    pub public: bool,
    pub managing_system: ManagingSystem,
}

impl TagTemplate {
    pub fn new(project_id: &str, location: &str, id: &str, public: bool, transferred: bool) -> Self {
        Self {
            resource_name: legacy_tag_template_fqn(project_id, location, id),
            project_id: project_id.to_string(),
            location: location.to_string(),
            id: id.to_string(),
            dataplex_resource_name: None,
            public,
            managing_system: ManagingSystem::from_transferred(transferred),
        }
    }

    /// Tag templates become global aspect types; the source region is gone
    /// from the name.
    pub fn dataplex_fqn(&self) -> String {
        dataplex_aspect_type_fqn(&self.project_id, &self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn managing_system_follows_transfer_flag() {
        let eg = EntryGroup::new("prj1", "us-west1", "eg1", false);
        assert_eq!(eg.managing_system, ManagingSystem::DataCatalog);
        assert_eq!(eg.resource_name, "projects/prj1/locations/us-west1/entryGroups/eg1");

        let tt = TagTemplate::new("prj1", "eu", "tt1", true, true);
        assert_eq!(tt.managing_system, ManagingSystem::Dataplex);
        assert!(tt.public);
    }

    #[test]
    fn dataplex_names_relocate_tag_templates_only() {
        let eg = EntryGroup::new("prj1", "us-west1", "eg1", false);
        assert_eq!(eg.dataplex_fqn(), "projects/prj1/locations/us-west1/entryGroups/eg1");

        let tt = TagTemplate::new("prj1", "us-west1", "tt1", false, false);
        assert_eq!(tt.dataplex_fqn(), "projects/prj1/locations/global/aspectTypes/tt1");
    }

    #[test]
    fn managing_system_serializes_screaming_snake() {
        let json = serde_json::to_string(&ManagingSystem::DataCatalog).unwrap();
        assert_eq!(json, "\"DATA_CATALOG\"");
        let json = serde_json::to_string(&ManagingSystem::Dataplex).unwrap();
        assert_eq!(json, "\"DATAPLEX\"");
    }
}
