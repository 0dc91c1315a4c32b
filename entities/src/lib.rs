//! Domain entities shared by every stage of the transfer tooling: projects,
//! entry groups and tag templates, the resource-name grammar connecting the
//! Data Catalog and Dataplex shapes of each resource, and the JSON payloads
//! that travel between controllers and task handlers.

mod error;
mod names;
mod payloads;
mod project;
mod resource;
mod scope;

pub use error::EntityError;
pub use names::ResourceParts;
pub use names::dataplex_aspect_type_fqn;
pub use names::dataplex_entry_group_fqn;
pub use names::legacy_entry_group_fqn;
pub use names::legacy_tag_template_fqn;
pub use names::parse_entry_group_fqn;
pub use names::parse_tag_template_fqn;
pub use payloads::ConvertTagTemplateTask;
pub use payloads::FetchPoliciesTask;
pub use payloads::FetchProjectsTask;
pub use payloads::FetchResourcesTask;
pub use payloads::PolicyResourceRef;
pub use payloads::ResourceRef;
pub use payloads::ResourceTask;
pub use payloads::SearchResourceType;
pub use project::Ancestor;
pub use project::AncestryKind;
pub use project::Project;
pub use project::merge_projects;
pub use resource::EntryGroup;
pub use resource::ManagingSystem;
pub use resource::ResourceKind;
pub use resource::TagTemplate;
pub use scope::Scope;
pub use scope::ScopeKind;
