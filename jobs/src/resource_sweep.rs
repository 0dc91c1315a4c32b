//! Shared fan-out for the transfer and cleanup stages: both walk the join
//! views within a scope, keep the resources one managing system owns, and
//! enqueue a plain resource task for each onto the base queue.

use anyhow::bail;
use tracing::info;

use transfer_cloud_tasks::submit_all;
use transfer_common::ResourceTypeChoice;
use transfer_entities::ManagingSystem;
use transfer_entities::ResourceKind;
use transfer_entities::ResourceRef;
use transfer_entities::ResourceTask;
use transfer_entities::Scope;
use transfer_entities::SearchResourceType;

use crate::cli::TransferArgs;
use crate::context::JobContext;

pub(crate) async fn run(
    args: TransferArgs,
    ctx: JobContext,
    system: ManagingSystem,
    queue_default: &str,
) -> anyhow::Result<()> {
    let warehouse = ctx.warehouse(&args.common);

    let payloads = collect_payloads(
        &warehouse,
        &args.scope,
        args.resource_types,
        system,
    )
    .await?;
    info!(count = payloads.len(), system = %system, "resources in scope");

    if payloads.is_empty() {
        return Ok(());
    }

    let publisher = ctx.publisher(&args.service, queue_default);
    publisher.ensure_base_queue().await?;

    let report = submit_all(
        payloads,
        |task| format!("{}:{}", task.resource_type, task.resource.resource_name),
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

async fn collect_payloads(
    warehouse: &transfer_warehouse::Warehouse,
    scope: &Scope,
    resource_types: ResourceTypeChoice,
    system: ManagingSystem,
) -> anyhow::Result<Vec<ResourceTask>> {
    let systems = [system];
    let resource_types = resource_types.resolve();
    let mut payloads = Vec::new();

    if resource_types.contains(&SearchResourceType::EntryGroup) {
        let (rows, _) = warehouse.entry_groups_within_scope(scope, &systems).await?;
        payloads.extend(rows.into_iter().map(|row| ResourceTask {
            resource_type: ResourceKind::EntryGroup,
            resource: ResourceRef {
                project_id: row.project_id,
                location: row.location,
                resource_name: row.entry_group_id,
            },
        }));
    }
    if resource_types.contains(&SearchResourceType::TagTemplate) {
        let (rows, _) = warehouse.tag_templates_within_scope(scope, &systems).await?;
        payloads.extend(rows.into_iter().map(|row| ResourceTask {
            resource_type: ResourceKind::TagTemplate,
            resource: ResourceRef {
                project_id: row.project_id,
                location: row.location,
                resource_name: row.tag_template_id,
            },
        }));
    }
    Ok(payloads)
}
