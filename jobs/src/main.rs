//! Entry point for the `transfer-jobs` binary. Each subcommand is one
//! scheduled controller; scheduling itself lives outside this repo.

use clap::Parser;

use transfer_jobs::Cli;
use transfer_jobs::Command;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    transfer_common::init_logging("info");

    let cli = Cli::parse();
    match cli.command {
        Command::FetchProjects(args) => transfer_jobs::fetch_projects::run(args).await,
        Command::FetchResources(args) => transfer_jobs::fetch_resources::run(args).await,
        Command::FindResourceNames(args) => transfer_jobs::find_resource_names::run(args).await,
        Command::FetchPolicies(args) => transfer_jobs::fetch_policies::run(args).await,
        Command::ConvertPrivateTagTemplates(args) => {
            transfer_jobs::convert_private_tag_templates::run(args).await
        }
        Command::TransferResources(args) => transfer_jobs::transfer_resources::run(args).await,
        Command::CleanUp(args) => transfer_jobs::clean_up::run(args).await,
        Command::Analytics(args) => transfer_jobs::analytics::run(args).await,
        Command::AuditLogs(args) => transfer_jobs::audit_logs::run(args).await,
    }
}
