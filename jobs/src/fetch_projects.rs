//! Project discovery controller. Resolves the organization above the anchor
//! project, searches the asset inventory for every project with a catalog
//! API enabled and enqueues one enrichment task per merged project record.

use anyhow::Context;
use anyhow::bail;
use chrono::Utc;
use tracing::info;

use transfer_cloud_tasks::submit_all;
use transfer_entities::FetchProjectsTask;
use transfer_entities::merge_projects;

use crate::cli::FetchProjectsArgs;
use crate::context::JobContext;

pub const QUEUE: &str = "fetch-projects";
pub const HANDLER: &str = "fetch-projects-handler";

pub async fn run(args: FetchProjectsArgs) -> anyhow::Result<()> {
    let ctx = JobContext::new(&args.common, &args.service, HANDLER);
    run_with(args, ctx).await
}

pub async fn run_with(args: FetchProjectsArgs, ctx: JobContext) -> anyhow::Result<()> {
    let organization = ctx
        .resource_manager()
        .organization_number(&ctx.project)
        .await
        .with_context(|| {
            format!("not enough permissions or {} does not exist", ctx.project)
        })?
        .with_context(|| format!("project {} is not part of an organization", ctx.project))?;

    let assets = ctx.asset(&organization);
    let projects = merge_projects(assets.fetch_projects().await?);
    info!(count = projects.len(), %organization, "discovered projects");

    let publisher = ctx.publisher(&args.service, QUEUE);
    publisher.ensure_base_queue().await?;

    let created_at = Utc::now().date_naive();
    let payloads: Vec<FetchProjectsTask> = projects
        .into_iter()
        .map(|project| FetchProjectsTask {
            project_id: project.project_id,
            project_number: project.project_number,
            data_catalog_api_enabled: project.data_catalog_api_enabled,
            dataplex_api_enabled: project.dataplex_api_enabled,
            created_at,
        })
        .collect();

    let report = submit_all(
        payloads,
        |task| task.project_id.clone(),
        |task| {
            let publisher = &publisher;
            let ctx = &ctx;
            async move {
                publisher
                    .create_task(&task, &ctx.handler_name, &ctx.project, &ctx.service_location)
                    .await
            }
        },
    )
    .await;

    if !report.all_ok() {
        bail!("{} errors occurred during task creation", report.errors);
    }
    Ok(())
}
