//! Mapping controller. Ensures the mapping tables and join views exist, then
//! fans one probe task per snapshot resource onto region subqueues sized
//! from the Dataplex read quotas.

use anyhow::bail;
use tracing::info;

use transfer_catalog_clients::DATAPLEX_CONTENT_READS_PER_USER_QUOTA;
use transfer_catalog_clients::DATAPLEX_CONTENT_READS_QUOTA;
use transfer_catalog_clients::DATAPLEX_SERVICE;
use transfer_cloud_tasks::submit_all;
use transfer_entities::ResourceKind;
use transfer_entities::ResourceRef;
use transfer_entities::ResourceTask;
use transfer_warehouse::TableName;
use transfer_warehouse::ViewName;

use crate::cli::FindResourceNamesArgs;
use crate::context::JobContext;
use crate::routing::message_region;
use crate::routing::queue_regions;

pub const QUEUE: &str = "find-resource-names";
pub const HANDLER: &str = "find-resource-names-handler";

/// Dispatch rate used when the quota lookup has nothing for us.
const FALLBACK_QUOTA_RPS: u32 = 2;

pub async fn run(args: FindResourceNamesArgs) -> anyhow::Result<()> {
    let ctx = JobContext::new(&args.common, &args.service, HANDLER);
    run_with(args, ctx).await
}

pub async fn run_with(args: FindResourceNamesArgs, ctx: JobContext) -> anyhow::Result<()> {
    let warehouse = ctx.warehouse(&args.common);

    warehouse.ensure_table(TableName::EntryGroupsResourceMapping).await?;
    warehouse.ensure_table(TableName::TagTemplatesResourceMapping).await?;
    warehouse.ensure_view(ViewName::EntryGroups).await?;
    warehouse.ensure_view(ViewName::TagTemplates).await?;

    let (entry_groups, _) = warehouse.latest_entry_groups().await?;
    let (tag_templates, _) = warehouse.latest_tag_templates().await?;
    info!(
        entry_groups = entry_groups.len(),
        tag_templates = tag_templates.len(),
        "fetched resources"
    );

    let mut payloads: Vec<ResourceTask> = Vec::with_capacity(entry_groups.len() + tag_templates.len());
    payloads.extend(entry_groups.iter().map(|row| ResourceTask {
        resource_type: ResourceKind::EntryGroup,
        resource: ResourceRef {
            project_id: row.project_id.clone(),
            location: row.location.clone(),
            resource_name: row.entry_group_id.clone(),
        },
    }));
    payloads.extend(tag_templates.iter().map(|row| ResourceTask {
        resource_type: ResourceKind::TagTemplate,
        resource: ResourceRef {
            project_id: row.project_id.clone(),
            location: row.location.clone(),
            resource_name: row.tag_template_id.clone(),
        },
    }));

    let regions = queue_regions(payloads.iter().map(|task| task.resource.location.as_str()));

    let quotas = ctx.quotas();
    let per_region = quotas
        .default_quota_value(&ctx.project, DATAPLEX_SERVICE, DATAPLEX_CONTENT_READS_QUOTA)
        .await?;
    let per_user = quotas
        .default_quota_value(
            &ctx.project,
            DATAPLEX_SERVICE,
            DATAPLEX_CONTENT_READS_PER_USER_QUOTA,
        )
        .await?;
    let quota_rps = per_region
        .into_iter()
        .chain(per_user)
        .min()
        .unwrap_or(FALLBACK_QUOTA_RPS);

    let publisher = ctx.publisher(&args.service, QUEUE);
    publisher
        .prepare_region_queues(&regions, quota_rps, ctx.quota_consumption)
        .await?;

    let report = submit_all(
        payloads,
        |task| format!("{}:{}", task.resource_type, task.resource.resource_name),
        |task| {
            let publisher = &publisher;
            let ctx = &ctx;
            async move {
                let region = message_region(&task.resource.location).to_string();
                publisher
                    .create_task_in_region(
                        &region,
                        &task,
                        &ctx.handler_name,
                        &ctx.project,
                        &ctx.service_location,
                    )
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
