//! The resource-name grammar.
//!
//! Data Catalog names a resource
//! `projects/{p}/locations/{l}/(tagTemplates|entryGroups)/{id}`. After the
//! server-side transfer the same logical resource lives in Dataplex: entry
//! groups keep their shape, tag templates become aspect types under
//! `locations/global`. Parsers accept exactly these shapes and nothing else.

use crate::error::EntityError;

/// The `(project, location, id)` triple every resource name reduces to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceParts {
    pub project_id: String,
    pub location: String,
    pub id: String,
}

pub fn legacy_entry_group_fqn(project_id: &str, location: &str, id: &str) -> String {
    format!("projects/{project_id}/locations/{location}/entryGroups/{id}")
}

pub fn legacy_tag_template_fqn(project_id: &str, location: &str, id: &str) -> String {
    format!("projects/{project_id}/locations/{location}/tagTemplates/{id}")
}

/// Dataplex entry groups keep the Data Catalog shape, region included.
pub fn dataplex_entry_group_fqn(project_id: &str, location: &str, id: &str) -> String {
    format!("projects/{project_id}/locations/{location}/entryGroups/{id}")
}

/// Aspect types are always global, whatever region the template came from.
pub fn dataplex_aspect_type_fqn(project_id: &str, id: &str) -> String {
    format!("projects/{project_id}/locations/global/aspectTypes/{id}")
}

/// Splits `name` on `/` and checks the literal segments at positions 0, 2
/// and 4 while capturing the variable ones.
fn parse_collection(name: &str, collections: &[&str]) -> Option<ResourceParts> {
    let segments: Vec<&str> = name.split('/').collect();
    let [p_lit, project_id, l_lit, location, collection, id] = segments.as_slice() else {
        return None;
    };
    if *p_lit != "projects" || *l_lit != "locations" {
        return None;
    }
    if !collections.contains(collection) || project_id.is_empty() || location.is_empty() || id.is_empty() {
        return None;
    }
    Some(ResourceParts {
        project_id: (*project_id).to_string(),
        location: (*location).to_string(),
        id: (*id).to_string(),
    })
}

/// Parses an entry group name, Data Catalog or Dataplex shape (identical).
pub fn parse_entry_group_fqn(name: &str) -> Result<ResourceParts, EntityError> {
    parse_collection(name, &["entryGroups"])
        .ok_or_else(|| EntityError::Format(format!("incorrect entry group name: {name}")))
}

/// Parses a tag template name. Accepts the Data Catalog `tagTemplates` shape
/// and the Dataplex `aspectTypes` shape; everything else is a format fault.
pub fn parse_tag_template_fqn(name: &str) -> Result<ResourceParts, EntityError> {
    parse_collection(name, &["tagTemplates", "aspectTypes"])
        .ok_or_else(|| EntityError::Format(format!("incorrect tag template name: {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn entry_group_round_trip() {
        let fqn = legacy_entry_group_fqn("prj1", "us-west1", "eg1");
        assert_eq!(fqn, "projects/prj1/locations/us-west1/entryGroups/eg1");
        let parts = parse_entry_group_fqn(&fqn).unwrap();
        assert_eq!(
            parts,
            ResourceParts {
                project_id: "prj1".to_string(),
                location: "us-west1".to_string(),
                id: "eg1".to_string(),
            }
        );
    }

    #[test]
    fn tag_template_round_trip_both_shapes() {
        let legacy = legacy_tag_template_fqn("prj1", "eu", "tt1");
        assert_eq!(parse_tag_template_fqn(&legacy).unwrap().id, "tt1");

        let dataplex = dataplex_aspect_type_fqn("prj1", "tt1");
        let parts = parse_tag_template_fqn(&dataplex).unwrap();
        assert_eq!(parts.location, "global");
        assert_eq!(parts.id, "tt1");
    }

    #[test]
    fn rejects_foreign_shapes() {
        assert!(parse_entry_group_fqn("projects/p/locations/l/tagTemplates/t").is_err());
        assert!(parse_tag_template_fqn("projects/p/locations/l/entryGroups/e").is_err());
        assert!(parse_entry_group_fqn("projects/p/entryGroups/e").is_err());
        assert!(parse_entry_group_fqn("organizations/1/locations/l/entryGroups/e").is_err());
        assert!(parse_entry_group_fqn("projects/p/locations/l/entryGroups/e/extra").is_err());
        assert!(parse_entry_group_fqn("projects//locations/l/entryGroups/e").is_err());
    }
}
