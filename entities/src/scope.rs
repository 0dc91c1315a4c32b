use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::error::EntityError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeKind {
    Organization,
    Folder,
    Project,
}

/// A filter over project ancestry: everything under one organization or
/// folder, or a single project (matched by project number).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub kind: ScopeKind,
    pub id: String,
}

impl FromStr for Scope {
    type Err = EntityError;

    /// Accepts `organizations/{n}`, `folders/{n}` or `projects/{n}`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            EntityError::Format(format!(
                "invalid scope `{value}`: expected organizations/{{orgNumber}}, \
                 folders/{{folderNumber}} or projects/{{projectNumber}}"
            ))
        };

        let (collection, id) = value.split_once('/').ok_or_else(invalid)?;
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let kind = match collection {
            "organizations" => ScopeKind::Organization,
            "folders" => ScopeKind::Folder,
            "projects" => ScopeKind::Project,
            _ => return Err(invalid()),
        };
        Ok(Scope {
            kind,
            id: id.to_string(),
        })
    }
}
