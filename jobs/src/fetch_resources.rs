//! Enumeration controller. For every project in the latest snapshot, seeds
//! the six initial search tasks: entry groups and public/private tag
//! templates, each split by transfer status. The handlers chain themselves
//! through pagination from there.

use anyhow::bail;
use chrono::NaiveDate;
use chrono::Utc;
use tracing::info;

use transfer_cloud_tasks::submit_all;
use transfer_entities::FetchResourcesTask;
use transfer_entities::SearchResourceType;

use crate::cli::FetchResourcesArgs;
use crate::context::JobContext;

pub const QUEUE: &str = "fetch-resources";
pub const HANDLER: &str = "fetch-resources-handler";

fn initial_tasks(project: &str, created_at: NaiveDate) -> Vec<FetchResourcesTask> {
    let task = |resource_type, is_transferred, is_public| FetchResourcesTask {
        scope: project.to_string(),
        resource_type,
        next_page_token: None,
        is_transferred,
        created_at,
        is_public,
    };

    vec![
        task(SearchResourceType::TagTemplate, true, Some(true)),
        task(SearchResourceType::TagTemplate, true, Some(false)),
        task(SearchResourceType::TagTemplate, false, Some(true)),
        task(SearchResourceType::TagTemplate, false, Some(false)),
        task(SearchResourceType::EntryGroup, true, None),
        task(SearchResourceType::EntryGroup, false, None),
    ]
}

pub async fn run(args: FetchResourcesArgs) -> anyhow::Result<()> {
    let ctx = JobContext::new(&args.common, &args.service, HANDLER);
    run_with(args, ctx).await
}

pub async fn run_with(args: FetchResourcesArgs, ctx: JobContext) -> anyhow::Result<()> {
    let projects = ctx.warehouse(&args.common).project_ids_to_fetch().await?;
    info!(count = projects.len(), "projects to enumerate");

    let publisher = ctx.publisher(&args.service, QUEUE);
    publisher.ensure_base_queue().await?;

    let created_at = Utc::now().date_naive();
    let payloads: Vec<FetchResourcesTask> = projects
        .iter()
        .flat_map(|project| initial_tasks(project, created_at))
        .collect();

    let report = submit_all(
        payloads,
        |task| format!("{}/{}", task.scope, task.resource_type.as_str()),
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
