//! Visibility-conversion controller: one task per private tag template
//! within scope.

use anyhow::bail;
use tracing::info;

use transfer_cloud_tasks::submit_all;
use transfer_entities::ConvertTagTemplateTask;

use crate::cli::ScopedArgs;
use crate::context::JobContext;

pub const QUEUE: &str = "convert-private-tag-templates";
pub const HANDLER: &str = "convert-private-tag-templates-handler";

pub async fn run(args: ScopedArgs) -> anyhow::Result<()> {
    let ctx = JobContext::new(&args.common, &args.service, HANDLER);
    run_with(args, ctx).await
}

pub async fn run_with(args: ScopedArgs, ctx: JobContext) -> anyhow::Result<()> {
    let warehouse = ctx.warehouse(&args.common);

    let (tag_templates, _) = warehouse.private_tag_templates(&args.scope).await?;
    info!(count = tag_templates.len(), "private tag templates in scope");

    if tag_templates.is_empty() {
        return Ok(());
    }

    let publisher = ctx.publisher(&args.service, QUEUE);
    publisher.ensure_base_queue().await?;

    let payloads: Vec<ConvertTagTemplateTask> = tag_templates
        .into_iter()
        .map(|row| ConvertTagTemplateTask {
            project_id: row.project_id,
            location: row.location,
            resource_name: row.tag_template_id,
        })
        .collect();

    let report = submit_all(
        payloads,
        |task| task.resource_name.clone(),
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
