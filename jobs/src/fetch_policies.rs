//! Policy-fetch controller. Reads the join views within the requested scope
//! and enqueues one task per `(resource, managing system)`. Legacy-side
//! lookups ride the base queue; Dataplex lookups ride region subqueues so
//! the IAM quota per region is respected. Aspect types are global and
//! therefore all share the us-central1 bucket.

use std::collections::BTreeSet;

use anyhow::bail;
use tracing::info;

use transfer_catalog_clients::DATAPLEX_IAM_POLICY_QUOTA;
use transfer_catalog_clients::DATAPLEX_SERVICE;
use transfer_cloud_tasks::TaskPublisher;
use transfer_cloud_tasks::submit_all;
use transfer_entities::FetchPoliciesTask;
use transfer_entities::ManagingSystem;
use transfer_entities::PolicyResourceRef;
use transfer_entities::ResourceKind;
use transfer_entities::SearchResourceType;

use crate::cli::FetchPoliciesArgs;
use crate::context::JobContext;
use crate::routing::GLOBAL_FALLBACK_REGION;
use crate::routing::message_region;

pub const QUEUE: &str = "iam-discovery";
pub const HANDLER: &str = "fetch-policies-handler";

const FALLBACK_QUOTA_RPS: u32 = 2;

/// Which queue a policy task belongs on.
fn task_region(task: &FetchPoliciesTask) -> Option<String> {
    match task.resource.system {
        ManagingSystem::DataCatalog => None,
        ManagingSystem::Dataplex => match task.resource_type {
            // Aspect types are globally scoped.
            ResourceKind::TagTemplate => Some(GLOBAL_FALLBACK_REGION.to_string()),
            ResourceKind::EntryGroup => Some(message_region(&task.resource.location).to_string()),
        },
    }
}

async fn enqueue(
    publisher: &TaskPublisher,
    ctx: &JobContext,
    task: FetchPoliciesTask,
) -> Result<(), transfer_cloud_tasks::QueueError> {
    match task_region(&task) {
        Some(region) => {
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
        None => {
            publisher
                .create_task(&task, &ctx.handler_name, &ctx.project, &ctx.service_location)
                .await
        }
    }
}

pub async fn run(args: FetchPoliciesArgs) -> anyhow::Result<()> {
    let ctx = JobContext::new(&args.common, &args.service, HANDLER);
    run_with(args, ctx).await
}

pub async fn run_with(args: FetchPoliciesArgs, ctx: JobContext) -> anyhow::Result<()> {
    let warehouse = ctx.warehouse(&args.common);

    let resource_types = args.resource_types.resolve();
    let systems = args.managing_systems.resolve();

    let mut payloads: Vec<FetchPoliciesTask> = Vec::new();

    if resource_types.contains(&SearchResourceType::EntryGroup) {
        let (rows, created_at) = warehouse
            .entry_groups_within_scope(&args.scope, &systems)
            .await?;
        payloads.extend(rows.into_iter().map(|row| FetchPoliciesTask {
            resource_type: ResourceKind::EntryGroup,
            created_at,
            resource: PolicyResourceRef {
                project_id: row.project_id,
                location: row.location,
                resource_name: row.entry_group_id,
                system: row.managing_system,
            },
        }));
    }
    if resource_types.contains(&SearchResourceType::TagTemplate) {
        let (rows, created_at) = warehouse
            .tag_templates_within_scope(&args.scope, &systems)
            .await?;
        payloads.extend(rows.into_iter().map(|row| FetchPoliciesTask {
            resource_type: ResourceKind::TagTemplate,
            created_at,
            resource: PolicyResourceRef {
                project_id: row.project_id,
                location: row.location,
                resource_name: row.tag_template_id,
                system: row.managing_system,
            },
        }));
    }

    if payloads.is_empty() {
        info!("nothing within scope, no tasks to create");
        return Ok(());
    }

    let publisher = ctx.publisher(&args.service, QUEUE);

    if payloads
        .iter()
        .any(|task| task.resource.system == ManagingSystem::DataCatalog)
    {
        publisher.ensure_base_queue().await?;
    }

    // Subqueues are prepared for the regions tasks actually land on, which
    // for Dataplex tag templates is always us-central1.
    let dataplex_regions: Vec<String> = payloads
        .iter()
        .filter_map(task_region)
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();
    if !dataplex_regions.is_empty() {
        let quota_rps = ctx
            .quotas()
            .default_quota_value(&ctx.project, DATAPLEX_SERVICE, DATAPLEX_IAM_POLICY_QUOTA)
            .await?
            .unwrap_or(FALLBACK_QUOTA_RPS);
        publisher
            .prepare_region_queues(&dataplex_regions, quota_rps, ctx.quota_consumption)
            .await?;
    }

    let report = submit_all(
        payloads,
        |task| {
            format!(
                "{}:{}:{}",
                task.resource.system, task.resource_type, task.resource.resource_name
            )
        },
        |task| {
            let publisher = &publisher;
            let ctx = &ctx;
            async move { enqueue(publisher, ctx, task).await }
        },
    )
    .await;

    if !report.all_ok() {
        bail!("{} errors occurred during task creation", report.errors);
    }
    Ok(())
}
