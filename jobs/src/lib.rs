//! The scheduled half of the pipeline: one controller per stage. Each
//! controller runs once per schedule, reads the latest upstream snapshot,
//! fans tasks out to its handler service and exits; the handlers do the
//! per-item work.

pub mod analytics;
pub mod audit_logs;
pub mod clean_up;
pub mod cli;
mod context;
pub mod convert_private_tag_templates;
pub mod fetch_policies;
pub mod fetch_projects;
pub mod fetch_resources;
pub mod find_resource_names;
mod resource_sweep;
mod routing;
pub mod transfer_resources;

pub use cli::Cli;
pub use cli::Command;
pub use context::Endpoints;
pub use context::JobContext;
