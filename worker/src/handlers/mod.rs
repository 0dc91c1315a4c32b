pub mod clean_up;
pub mod convert_private_tag_templates;
pub mod fetch_policies;
pub mod fetch_projects;
pub mod fetch_resources;
pub mod find_resource_names;
pub mod transfer_resources;
