use clap::Args;
use clap::Parser;

use transfer_common::CommonArgs;
use transfer_common::ManagingSystemChoice;
use transfer_common::ResourceTypeChoice;
use transfer_common::ServiceArgs;
use transfer_entities::Scope;

#[derive(Parser, Debug)]
#[command(version, about = "Catalog transfer tooling batch jobs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Discover every project in the organization with a catalog API enabled.
    FetchProjects(FetchProjectsArgs),
    /// Enumerate entry groups and tag templates across discovered projects.
    FetchResources(FetchResourcesArgs),
    /// Map each legacy resource to its Dataplex name.
    FindResourceNames(FindResourceNamesArgs),
    /// Fetch IAM policies from both catalogs for resources in scope.
    FetchPolicies(FetchPoliciesArgs),
    /// Flip private tag templates in scope to publicly readable.
    ConvertPrivateTagTemplates(ScopedArgs),
    /// Trigger the server-side transfer for legacy-managed resources.
    TransferResources(TransferArgs),
    /// Delete legacy copies of resources already managed by Dataplex.
    CleanUp(TransferArgs),
    /// Create the analytical views over policies and audit logs.
    Analytics(AnalyticsArgs),
    /// Set up the audit-log export sink into the dataset.
    AuditLogs(AuditLogsArgs),
}

#[derive(Args, Debug)]
pub struct FetchProjectsArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[command(flatten)]
    pub service: ServiceArgs,
}

#[derive(Args, Debug)]
pub struct FetchResourcesArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[command(flatten)]
    pub service: ServiceArgs,
}

#[derive(Args, Debug)]
pub struct FindResourceNamesArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[command(flatten)]
    pub service: ServiceArgs,
}

#[derive(Args, Debug)]
pub struct FetchPoliciesArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[command(flatten)]
    pub service: ServiceArgs,

    /// Scope of projects to cover: organizations/{n}, folders/{n} or
    /// projects/{n}.
    #[arg(long, short = 's')]
    pub scope: Scope,

    /// Resources to fetch IAM policies for.
    #[arg(long, value_enum, default_value_t = ResourceTypeChoice::Both)]
    pub resource_types: ResourceTypeChoice,

    /// System the policies should be fetched from.
    #[arg(long, value_enum, default_value_t = ManagingSystemChoice::Both)]
    pub managing_systems: ManagingSystemChoice,
}

#[derive(Args, Debug)]
pub struct ScopedArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[command(flatten)]
    pub service: ServiceArgs,

    /// Scope of projects to cover: organizations/{n}, folders/{n} or
    /// projects/{n}.
    #[arg(long, short = 's')]
    pub scope: Scope,
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[command(flatten)]
    pub service: ServiceArgs,

    /// Scope of projects to cover: organizations/{n}, folders/{n} or
    /// projects/{n}.
    #[arg(long, short = 's')]
    pub scope: Scope,

    /// Resource kinds to process.
    #[arg(long, value_enum, default_value_t = ResourceTypeChoice::Both)]
    pub resource_types: ResourceTypeChoice,
}

#[derive(Args, Debug)]
pub struct AnalyticsArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug)]
pub struct AuditLogsArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Name of the export sink.
    #[arg(long, default_value = "transfer-tooling-audit-logs")]
    pub log_sink_name: String,

    /// Log filter of the export sink. Defaults to data-access entries of
    /// both catalog services.
    #[arg(long)]
    pub log_filter: Option<String>,
}
